use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// One entry of a receiver's method table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: &'static str,
    pub arity: usize,
    pub visibility: Visibility,
}

impl MethodInfo {
    pub fn is_callable(&self, include_private: bool) -> bool {
        include_private || self.visibility == Visibility::Public
    }
}

pub fn find_method<'m>(
    methods: &'m [MethodInfo],
    name: &str,
    include_private: bool,
) -> Option<&'m MethodInfo> {
    methods
        .iter()
        .find(|m| m.name == name && m.is_callable(include_private))
}

/// A value that can receive a deferred invocation.
///
/// Usually implemented with [`performable!`](crate::performable) rather than by hand.
pub trait Performable: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn methods(&self) -> &'static [MethodInfo];

    fn responds_to(&self, method: &str, include_private: bool) -> bool {
        find_method(self.methods(), method, include_private).is_some()
    }

    /// Call `method` with `args`, returning its output serialized as json.
    fn invoke(&mut self, method: &str, args: &[Value]) -> anyhow::Result<Value>;

    /// Full state, embedded in the payload when this is not a record.
    fn state(&self) -> anyhow::Result<Value>;

    fn as_record(&self) -> Option<&dyn Record> {
        None
    }
}

/// Identity of a persisted record: enough to fetch it again from a store.
pub trait Record {
    fn primary_key_name(&self) -> &'static str;
    fn primary_key(&self) -> anyhow::Result<Value>;
}

pub trait PerformableType: Performable + Sized {
    const TYPE_NAME: &'static str;
    const METHODS: &'static [MethodInfo];
}
