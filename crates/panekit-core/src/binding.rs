#![forbid(unsafe_code)]

//! Target object binding.
//!
//! The engine never inspects the host's objects itself. A [`TargetBinding`]
//! resolves member symbols named by leaf records into [`Member`] handles,
//! change callbacks and visibility probes. Every resolution returns `None`
//! for unknown symbols; a stale document degrades to unbound presentation
//! instead of failing.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::record::PredicateKind;

/// A value read from or written to a bound member.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color([f32; 4]),
    Vector2([f32; 2]),
}

impl Value {
    /// Classify this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Color(_) => ValueKind::Color,
            Self::Vector2(_) => ValueKind::Vector2,
        }
    }
}

/// Type of a bound member, used to select leaf behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Color,
    Vector2,
}

/// Handle to one member of the target object.
///
/// `set` on a read-only member is a no-op; callers check `can_write` when
/// the distinction matters.
pub trait Member {
    /// Type of the member's value.
    fn kind(&self) -> ValueKind;

    /// Whether the member accepts writes.
    fn can_write(&self) -> bool;

    /// Read the current value.
    fn get(&self) -> Value;

    /// Write a new value.
    fn set(&self, value: Value);
}

/// Parameterless callable on the target object.
pub type Callback = Rc<dyn Fn()>;

/// Boolean predicate consulted for delegated visibility.
pub type VisibilityProbe = Rc<dyn Fn() -> bool>;

/// Resolves symbols named by element records against the target object.
pub trait TargetBinding {
    /// Resolve a member symbol. `None` means the symbol no longer exists.
    fn resolve(&self, symbol: &str) -> Option<Rc<dyn Member>>;

    /// Resolve a callable symbol (change callbacks, button actions).
    fn invoke(&self, symbol: &str) -> Option<Callback>;

    /// Resolve a boolean member for a delegated visibility rule.
    fn visibility_probe(&self, symbol: &str, kind: PredicateKind) -> Option<VisibilityProbe>;
}

struct Slot {
    value: Value,
    writable: bool,
}

/// In-process binding over a plain value map.
///
/// Always available; used by tests, demos and hosts whose target objects
/// are themselves just bags of values.
#[derive(Default)]
pub struct MemoryBinding {
    slots: Rc<RefCell<BTreeMap<String, Slot>>>,
    callbacks: RefCell<BTreeMap<String, Callback>>,
    probes: RefCell<BTreeMap<String, (PredicateKind, VisibilityProbe)>>,
}

impl MemoryBinding {
    /// Create an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a writable member.
    pub fn set_value(&self, symbol: impl Into<String>, value: Value) {
        self.slots.borrow_mut().insert(
            symbol.into(),
            Slot {
                value,
                writable: true,
            },
        );
    }

    /// Register (or overwrite) a read-only member.
    pub fn set_read_only(&self, symbol: impl Into<String>, value: Value) {
        self.slots.borrow_mut().insert(
            symbol.into(),
            Slot {
                value,
                writable: false,
            },
        );
    }

    /// Current value of a member, if registered.
    #[must_use]
    pub fn value(&self, symbol: &str) -> Option<Value> {
        self.slots
            .borrow()
            .get(symbol)
            .map(|slot| slot.value.clone())
    }

    /// Register a callable symbol.
    pub fn on_invoke(&self, symbol: impl Into<String>, callback: impl Fn() + 'static) {
        self.callbacks
            .borrow_mut()
            .insert(symbol.into(), Rc::new(callback));
    }

    /// Register a visibility predicate under a symbol and member kind.
    pub fn probe(
        &self,
        symbol: impl Into<String>,
        kind: PredicateKind,
        predicate: impl Fn() -> bool + 'static,
    ) {
        self.probes
            .borrow_mut()
            .insert(symbol.into(), (kind, Rc::new(predicate)));
    }
}

struct MemoryMember {
    symbol: String,
    slots: Rc<RefCell<BTreeMap<String, Slot>>>,
    kind: ValueKind,
    writable: bool,
}

impl Member for MemoryMember {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn can_write(&self) -> bool {
        self.writable
    }

    fn get(&self) -> Value {
        let slots = self.slots.borrow();
        match slots.get(&self.symbol) {
            Some(slot) => slot.value.clone(),
            // Member removed after resolution; keep returning something
            // of the resolved kind.
            None => match self.kind {
                ValueKind::Bool => Value::Bool(false),
                ValueKind::Int => Value::Int(0),
                ValueKind::Float => Value::Float(0.0),
                ValueKind::Text => Value::Text(String::new()),
                ValueKind::Color => Value::Color([0.0; 4]),
                ValueKind::Vector2 => Value::Vector2([0.0; 2]),
            },
        }
    }

    fn set(&self, value: Value) {
        if !self.writable {
            return;
        }
        let mut slots = self.slots.borrow_mut();
        if let Some(slot) = slots.get_mut(&self.symbol) {
            slot.value = value;
        }
    }
}

impl TargetBinding for MemoryBinding {
    fn resolve(&self, symbol: &str) -> Option<Rc<dyn Member>> {
        let slots = self.slots.borrow();
        let slot = slots.get(symbol)?;
        Some(Rc::new(MemoryMember {
            symbol: symbol.to_owned(),
            slots: Rc::clone(&self.slots),
            kind: slot.value.kind(),
            writable: slot.writable,
        }))
    }

    fn invoke(&self, symbol: &str) -> Option<Callback> {
        self.callbacks.borrow().get(symbol).cloned()
    }

    fn visibility_probe(&self, symbol: &str, kind: PredicateKind) -> Option<VisibilityProbe> {
        let probes = self.probes.borrow();
        let (registered_kind, probe) = probes.get(symbol)?;
        if *registered_kind != kind {
            return None;
        }
        Some(Rc::clone(probe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn value_kind_classification() {
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Int(3).kind(), ValueKind::Int);
        assert_eq!(Value::Float(0.5).kind(), ValueKind::Float);
        assert_eq!(Value::Text("a".into()).kind(), ValueKind::Text);
        assert_eq!(Value::Color([0.0; 4]).kind(), ValueKind::Color);
        assert_eq!(Value::Vector2([0.0; 2]).kind(), ValueKind::Vector2);
    }

    #[test]
    fn resolve_unknown_symbol_is_none() {
        let binding = MemoryBinding::new();
        assert!(binding.resolve("missing").is_none());
        assert!(binding.invoke("missing").is_none());
        assert!(
            binding
                .visibility_probe("missing", PredicateKind::Method)
                .is_none()
        );
    }

    #[test]
    fn member_read_write() {
        let binding = MemoryBinding::new();
        binding.set_value("speed", Value::Float(1.0));
        let member = binding.resolve("speed").unwrap();
        assert_eq!(member.kind(), ValueKind::Float);
        assert!(member.can_write());
        assert_eq!(member.get(), Value::Float(1.0));
        member.set(Value::Float(2.5));
        assert_eq!(binding.value("speed"), Some(Value::Float(2.5)));
    }

    #[test]
    fn read_only_member_ignores_writes() {
        let binding = MemoryBinding::new();
        binding.set_read_only("version", Value::Text("1.0".into()));
        let member = binding.resolve("version").unwrap();
        assert!(!member.can_write());
        member.set(Value::Text("2.0".into()));
        assert_eq!(binding.value("version"), Some(Value::Text("1.0".into())));
    }

    #[test]
    fn invoke_fires_registered_callback() {
        let binding = MemoryBinding::new();
        let hits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&hits);
        binding.on_invoke("reset", move || counter.set(counter.get() + 1));
        let callback = binding.invoke("reset").unwrap();
        callback();
        callback();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn probe_requires_matching_kind() {
        let binding = MemoryBinding::new();
        binding.probe("is_advanced", PredicateKind::Property, || true);
        assert!(
            binding
                .visibility_probe("is_advanced", PredicateKind::Property)
                .is_some()
        );
        assert!(
            binding
                .visibility_probe("is_advanced", PredicateKind::Method)
                .is_none()
        );
    }
}
