use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use nodemap_types::{DocumentKey, Locale};
use serde::{Deserialize, Serialize};

/// Points in a mapped object's life at which hooks may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    PrePersist,
    PostPersist,
    PreUpdate,
    PostUpdate,
    PreRemove,
    PostRemove,
    PostLoad,
    PreMove,
    PostMove,
    PreFlush,
    OnFlush,
    PostFlush,
    OnClear,
    PreCreateTranslation,
    PreUpdateTranslation,
    PostLoadTranslation,
    PreRemoveTranslation,
    PostRemoveTranslation,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 18] = [
        Self::PrePersist,
        Self::PostPersist,
        Self::PreUpdate,
        Self::PostUpdate,
        Self::PreRemove,
        Self::PostRemove,
        Self::PostLoad,
        Self::PreMove,
        Self::PostMove,
        Self::PreFlush,
        Self::OnFlush,
        Self::PostFlush,
        Self::OnClear,
        Self::PreCreateTranslation,
        Self::PreUpdateTranslation,
        Self::PostLoadTranslation,
        Self::PreRemoveTranslation,
        Self::PostRemoveTranslation,
    ];

    /// Name used to key callbacks in a class's mapping.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrePersist => "prePersist",
            Self::PostPersist => "postPersist",
            Self::PreUpdate => "preUpdate",
            Self::PostUpdate => "postUpdate",
            Self::PreRemove => "preRemove",
            Self::PostRemove => "postRemove",
            Self::PostLoad => "postLoad",
            Self::PreMove => "preMove",
            Self::PostMove => "postMove",
            Self::PreFlush => "preFlush",
            Self::OnFlush => "onFlush",
            Self::PostFlush => "postFlush",
            Self::OnClear => "onClear",
            Self::PreCreateTranslation => "preCreateTranslation",
            Self::PreUpdateTranslation => "preUpdateTranslation",
            Self::PostLoadTranslation => "postLoadTranslation",
            Self::PreRemoveTranslation => "preRemoveTranslation",
            Self::PostRemoveTranslation => "postRemoveTranslation",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown lifecycle event {s:?}"))
    }
}

/// Which delivery channels an event occurrence goes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Channels(u8);

impl Channels {
    pub const NONE: Channels = Channels(0);
    /// Per-class callback methods on the object.
    pub const CALLBACKS: Channels = Channels(1);
    /// The shared listener bus.
    pub const MANAGER: Channels = Channels(2);

    pub fn contains(self, other: Channels) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Channels {
    type Output = Channels;

    fn bitor(self, rhs: Channels) -> Channels {
        Channels(self.0 | rhs.0)
    }
}

/// Payload passed to callbacks and listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEventArgs {
    pub event: LifecycleEvent,
    pub document: DocumentKey,
    pub class_name: String,
    /// Node path of the document, once known.
    pub path: Option<String>,
    /// Locale concerned, for translation events.
    pub locale: Option<Locale>,
}

impl LifecycleEventArgs {
    pub fn new(event: LifecycleEvent, document: DocumentKey, class_name: impl Into<String>) -> Self {
        Self {
            event,
            document,
            class_name: class_name.into(),
            path: None,
            locale: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for event in LifecycleEvent::ALL {
            assert_eq!(event.as_str().parse::<LifecycleEvent>().unwrap(), event);
        }
        assert!("prepersist".parse::<LifecycleEvent>().is_err());
    }

    #[test]
    fn serde_uses_callback_names() {
        let json = serde_json::to_string(&LifecycleEvent::PostLoadTranslation).unwrap();
        assert_eq!(json, "\"postLoadTranslation\"");
    }

    #[test]
    fn channel_bits() {
        let both = Channels::CALLBACKS | Channels::MANAGER;
        assert!(both.contains(Channels::CALLBACKS));
        assert!(both.contains(Channels::MANAGER));
        assert!(!Channels::CALLBACKS.contains(Channels::MANAGER));
        assert!(Channels::NONE.is_empty());
        assert_eq!(Channels::default(), Channels::NONE);
        assert_eq!(both.bits(), 3);
    }

    #[test]
    fn args_builder() {
        let key = DocumentKey::generate();
        let args = LifecycleEventArgs::new(LifecycleEvent::PrePersist, key, "Page")
            .with_path("/page")
            .with_locale(Locale::new("de"));
        assert_eq!(args.path.as_deref(), Some("/page"));
        assert_eq!(args.locale, Some(Locale::new("de")));
    }
}
