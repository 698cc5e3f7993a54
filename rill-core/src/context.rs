use std::any::Any;
use std::sync::Arc;

/// An immutable, appendable value carrier propagated along the call chain of
/// a run.
///
/// Each [`with`](Context::with) call derives a new context layering one value
/// on top of the previous ones; the original is never mutated. Lookups are
/// type-keyed and see the newest layer first, so a later `with::<T>` shadows
/// an earlier one without erasing it from contexts that were derived before.
///
/// Cloning is cheap (an `Arc` bump) and a clone shares all layers with its
/// source.
///
/// ```
/// use rill_core::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct Depth(u32);
///
/// let root = Context::new();
/// let child = root.with(Depth(1));
/// assert_eq!(child.get::<Depth>(), Some(&Depth(1)));
/// assert!(root.get::<Depth>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Layer>>,
}

struct Layer {
    parent: Option<Arc<Layer>>,
    value: Box<dyn Any + Send + Sync>,
}

impl Context {
    /// An empty root context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a new context carrying `value` in addition to everything the
    /// receiver carries.
    pub fn with<T>(&self, value: T) -> Context
    where
        T: Send + Sync + 'static,
    {
        Context {
            head: Some(Arc::new(Layer {
                parent: self.head.clone(),
                value: Box::new(value),
            })),
        }
    }

    /// Look up the most recently layered value of type `T`, if any.
    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        let mut current = self.head.as_deref();
        while let Some(layer) = current {
            if let Some(value) = layer.value.downcast_ref::<T>() {
                return Some(value);
            }
            current = layer.parent.as_deref();
        }
        None
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut depth = 0usize;
        let mut current = self.head.as_deref();
        while let Some(layer) = current {
            depth += 1;
            current = layer.parent.as_deref();
        }
        f.debug_struct("Context").field("layers", &depth).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct SpanSlot(&'static str);

    #[derive(Debug, PartialEq)]
    struct GateSlot(u32);

    #[test]
    fn test_empty_context_has_nothing() {
        let ctx = Context::new();
        assert!(ctx.get::<SpanSlot>().is_none());
    }

    #[test]
    fn test_layered_lookup() {
        let ctx = Context::new().with(SpanSlot("root")).with(GateSlot(7));
        assert_eq!(ctx.get::<SpanSlot>(), Some(&SpanSlot("root")));
        assert_eq!(ctx.get::<GateSlot>(), Some(&GateSlot(7)));
    }

    #[test]
    fn test_newest_layer_shadows() {
        let ctx = Context::new().with(SpanSlot("outer"));
        let inner = ctx.with(SpanSlot("inner"));
        assert_eq!(inner.get::<SpanSlot>(), Some(&SpanSlot("inner")));
        // The outer context is unaffected by the derived layer.
        assert_eq!(ctx.get::<SpanSlot>(), Some(&SpanSlot("outer")));
    }

    #[test]
    fn test_clone_shares_layers() {
        let ctx = Context::new().with(GateSlot(1));
        let clone = ctx.clone();
        assert_eq!(clone.get::<GateSlot>(), Some(&GateSlot(1)));
    }

    #[test]
    fn test_concurrent_runs_do_not_interfere() {
        let root = Context::new();
        let run_a = root.with(SpanSlot("a"));
        let run_b = root.with(SpanSlot("b"));
        assert_eq!(run_a.get::<SpanSlot>(), Some(&SpanSlot("a")));
        assert_eq!(run_b.get::<SpanSlot>(), Some(&SpanSlot("b")));
        assert!(root.get::<SpanSlot>().is_none());
    }
}
