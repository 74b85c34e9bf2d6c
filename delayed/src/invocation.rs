use serde_json::Value;

use crate::{
    core::{find_method, MethodInfo, Performable},
    models::{InvocationPayload, ReceiverPayload},
    Delayed, EntityReference, InvocationError, Receiver, Resolution,
};

/// A method call captured now and performed later, possibly in another process.
///
/// The receiver is either a live object or, for persisted records that could
/// not be loaded yet, an [`EntityReference`]. Serializing never embeds a record,
/// only its reference; see [`DeferredInvocation::to_payload`].
#[derive(Debug)]
pub struct DeferredInvocation {
    receiver: Receiver,
    method_name: String,
    args: Vec<Value>,
}

impl DeferredInvocation {
    /// Fails with [`InvocationError::UndefinedMethod`] unless `receiver` has
    /// `method` (private methods included) taking `args.len()` arguments.
    pub fn new(
        receiver: impl Performable + 'static,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<Self, InvocationError> {
        Self::boxed(Box::new(receiver), method, args)
    }

    pub fn boxed(
        receiver: Box<dyn Performable>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<Self, InvocationError> {
        let method_name = method.into();
        validate(receiver.type_name(), receiver.methods(), &method_name, &args)?;

        Ok(Self {
            receiver: Receiver::Concrete(receiver),
            method_name,
            args,
        })
    }

    /// Rebuild an invocation whose receiver was stored as a reference.
    ///
    /// The record is loaded straight away. If it no longer exists the
    /// reference is kept and [`perform`](Self::perform) becomes a no-op.
    pub async fn from_reference(
        reference: EntityReference,
        method: impl Into<String>,
        args: Vec<Value>,
        delayed: &Delayed,
    ) -> anyhow::Result<Self> {
        let method_name = method.into();
        let methods = delayed
            .registry()
            .methods(&reference.entity_type)
            .ok_or_else(|| InvocationError::UnknownType(reference.entity_type.clone()))?;
        validate(&reference.entity_type, methods, &method_name, &args)?;

        let mut invocation = Self {
            receiver: Receiver::Reference(reference),
            method_name,
            args,
        };
        invocation.receiver(Resolution::Load, delayed).await?;

        Ok(invocation)
    }

    pub async fn from_payload(payload: InvocationPayload, delayed: &Delayed) -> anyhow::Result<Self> {
        let InvocationPayload {
            receiver,
            method_name,
            args,
        } = payload;

        match receiver {
            ReceiverPayload::Object { type_name, state } => {
                let object = delayed.registry().instantiate(&type_name, state)?;
                Ok(Self::boxed(object, method_name, args)?)
            }
            ReceiverPayload::Reference(reference) => {
                Self::from_reference(reference, method_name, args, delayed).await
            }
        }
    }

    /// Read the receiver.
    ///
    /// With [`Resolution::Load`] a reference is swapped for the record it points
    /// to, when that record still exists. With [`Resolution::Skip`] the store is
    /// never touched.
    pub async fn receiver(
        &mut self,
        resolution: Resolution,
        delayed: &Delayed,
    ) -> anyhow::Result<&Receiver> {
        if resolution == Resolution::Load {
            if let Receiver::Reference(reference) = &self.receiver {
                let loaded = delayed.load(reference).await?;
                if let Some(object) = loaded {
                    self.receiver = Receiver::Concrete(object);
                }
            }
        }

        Ok(&self.receiver)
    }

    /// The stored receiver as it is, never loading anything.
    pub fn peek_receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Perform the call. `Ok(None)` when the receiver no longer exists.
    ///
    /// Errors returned by the method itself are passed through untouched.
    pub async fn perform(&mut self, delayed: &Delayed) -> anyhow::Result<Option<Value>> {
        self.receiver(Resolution::Load, delayed).await?;

        match &mut self.receiver {
            Receiver::Concrete(object) => {
                tracing::debug!("Performing {}#{}", object.type_name(), self.method_name);
                let output = object.invoke(&self.method_name, &self.args)?;
                Ok(Some(output))
            }
            Receiver::Reference(reference) => {
                tracing::debug!("{} not found, skipping {}", reference, self.method_name);
                Ok(None)
            }
        }
    }

    /// Serializable form of this invocation.
    ///
    /// Records are replaced by their [`EntityReference`], other receivers are
    /// embedded in full. The receiver is read with [`Resolution::Skip`] and
    /// left as it was, whether or not this succeeds.
    pub fn to_payload(&self) -> anyhow::Result<InvocationPayload> {
        let receiver = match self.peek_receiver() {
            Receiver::Concrete(object) if object.as_record().is_some() => {
                ReceiverPayload::Reference(EntityReference::of(object.as_ref())?)
            }
            Receiver::Concrete(object) => ReceiverPayload::Object {
                type_name: object.type_name().to_string(),
                state: object.state()?,
            },
            Receiver::Reference(reference) => ReceiverPayload::Reference(reference.clone()),
        };

        Ok(InvocationPayload {
            receiver,
            method_name: self.method_name.clone(),
            args: self.args.clone(),
        })
    }

    pub fn display_name(&self) -> String {
        format!("{}#{}", self.receiver_type(), self.method_name)
    }

    /// Forwarded to the receiver. A reference that could not be loaded responds to nothing.
    pub fn responds_to(&self, method: &str, include_private: bool) -> bool {
        self.receiver
            .as_concrete()
            .map(|object| object.responds_to(method, include_private))
            .unwrap_or(false)
    }

    pub fn receiver_type(&self) -> &str {
        self.receiver.type_name()
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

fn validate(
    type_name: &str,
    methods: &[MethodInfo],
    method: &str,
    args: &[Value],
) -> Result<(), InvocationError> {
    let info = find_method(methods, method, true).ok_or_else(|| InvocationError::UndefinedMethod {
        type_name: type_name.to_string(),
        method: method.to_string(),
    })?;

    crate::args::check_arity(type_name, method, args, info.arity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::memory::MemoryStore, Config};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    static PINGS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Serialize, Deserialize)]
    struct Host {
        id: u32,
        name: String,
    }

    impl Host {
        fn ping(&mut self) -> anyhow::Result<u32> {
            PINGS.fetch_add(1, Ordering::SeqCst);
            Ok(self.id)
        }

        fn rename(&mut self, name: String) -> anyhow::Result<String> {
            self.name = name;
            Ok(self.name.clone())
        }

        fn forget(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    crate::performable! {
        struct Host: record(id) {
            pub fn ping();
            pub fn rename(name: String);
            fn forget();
        }
    }

    #[derive(Serialize, Deserialize)]
    struct Adder {
        base: i64,
    }

    impl Adder {
        fn add(&mut self, a: i64, b: i64) -> anyhow::Result<i64> {
            Ok(self.base + a + b)
        }
    }

    crate::performable! {
        struct Adder {
            pub fn add(a: i64, b: i64);
        }
    }

    fn delayed(store: Arc<MemoryStore>) -> Delayed {
        Delayed::new(
            Config::builder()
                .name("invocation-tests")
                .store(Box::new(store))
                .build(),
        )
        .register::<Host>()
        .register::<Adder>()
    }

    fn host(id: u32) -> Host {
        Host {
            id,
            name: format!("host-{}", id),
        }
    }

    #[test]
    fn undefined_method() {
        let err = DeferredInvocation::new(host(1), "reboot", vec![]).unwrap_err();

        assert!(matches!(
            err,
            InvocationError::UndefinedMethod { ref type_name, ref method }
                if type_name == "Host" && method == "reboot"
        ));
        assert_eq!("undefined method `reboot' for Host", err.to_string());
    }

    #[test]
    fn private_method_is_accepted() {
        let invocation = DeferredInvocation::new(host(1), "forget", vec![]).expect("private");

        assert!(invocation.responds_to("forget", true));
        assert!(!invocation.responds_to("forget", false));
    }

    #[test]
    fn wrong_arity() {
        let err = DeferredInvocation::new(Adder { base: 0 }, "add", vec![json!(1)]).unwrap_err();

        assert!(matches!(
            err,
            InvocationError::ArgumentCount {
                given: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn display_name() {
        let invocation = DeferredInvocation::new(host(1), "ping", vec![]).unwrap();

        assert_eq!("Host#ping", invocation.display_name());
        assert_eq!("ping", invocation.method_name());
        assert!(invocation.args().is_empty());
    }

    #[tokio::test]
    async fn perform_matches_direct_call() {
        let delayed = delayed(Arc::new(MemoryStore::new()));
        let mut invocation =
            DeferredInvocation::new(Adder { base: 10 }, "add", vec![json!(2), json!(3)]).unwrap();

        let direct = Adder { base: 10 }.add(2, 3).unwrap();
        let output = invocation.perform(&delayed).await.unwrap();

        assert_eq!(Some(json!(direct)), output);
    }

    #[test]
    fn record_payload_holds_only_reference() {
        let invocation = DeferredInvocation::new(host(42), "rename", vec![json!("edge")]).unwrap();

        let payload = invocation.to_payload().unwrap();

        assert_eq!(
            ReceiverPayload::Reference(EntityReference::new("Host", json!(42))),
            payload.receiver
        );
        assert_eq!(vec![json!("edge")], payload.args);
        assert!(!invocation.peek_receiver().is_reference());
    }

    #[test]
    fn object_payload_is_embedded() {
        let invocation =
            DeferredInvocation::new(Adder { base: 1 }, "add", vec![json!(1), json!(1)]).unwrap();

        let payload = invocation.to_payload().unwrap();

        assert_eq!(
            ReceiverPayload::Object {
                type_name: "Adder".to_string(),
                state: json!({ "base": 1 }),
            },
            payload.receiver
        );
    }

    #[tokio::test]
    async fn skip_leaves_reference_unresolved() {
        let store = Arc::new(MemoryStore::new());
        store.insert(&host(5)).unwrap();
        let delayed = delayed(store.clone());

        let mut invocation = DeferredInvocation {
            receiver: Receiver::Reference(EntityReference::new("Host", json!(5))),
            method_name: "ping".into(),
            args: vec![],
        };

        let receiver = invocation.receiver(Resolution::Skip, &delayed).await.unwrap();
        assert!(receiver.is_reference());
        assert_eq!(0, store.lookups());

        let receiver = invocation.receiver(Resolution::Load, &delayed).await.unwrap();
        assert!(!receiver.is_reference());
        assert_eq!(1, store.lookups());

        // already concrete, no further lookups
        invocation.receiver(Resolution::Load, &delayed).await.unwrap();
        assert_eq!(1, store.lookups());
    }

    #[tokio::test]
    async fn from_reference_loads_immediately() {
        let store = Arc::new(MemoryStore::new());
        store.insert(&host(9)).unwrap();
        let delayed = delayed(store.clone());

        let invocation = DeferredInvocation::from_reference(
            EntityReference::new("Host", json!(9)),
            "rename",
            vec![json!("nine")],
            &delayed,
        )
        .await
        .unwrap();

        assert!(!invocation.peek_receiver().is_reference());
        assert!(invocation.responds_to("ping", false));
    }

    #[tokio::test]
    async fn from_reference_validates_method() {
        let delayed = delayed(Arc::new(MemoryStore::new()));

        let err = DeferredInvocation::from_reference(
            EntityReference::new("Host", json!(9)),
            "explode",
            vec![],
            &delayed,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InvocationError>(),
            Some(InvocationError::UndefinedMethod { .. })
        ));
    }

    #[tokio::test]
    async fn from_reference_unknown_type() {
        let delayed = delayed(Arc::new(MemoryStore::new()));

        let err = DeferredInvocation::from_reference(
            EntityReference::new("Ghost", json!(1)),
            "ping",
            vec![],
            &delayed,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InvocationError>(),
            Some(InvocationError::UnknownType(_))
        ));
    }

    #[tokio::test]
    async fn missing_record_is_a_no_op() {
        let delayed = delayed(Arc::new(MemoryStore::new()));
        let before = PINGS.load(Ordering::SeqCst);

        let mut invocation = DeferredInvocation::from_reference(
            EntityReference::new("Host", json!(404)),
            "ping",
            vec![],
            &delayed,
        )
        .await
        .expect("stale reference is not an error");

        assert_eq!("Host#ping", invocation.display_name());
        assert!(!invocation.responds_to("ping", false));
        assert_eq!(None, invocation.perform(&delayed).await.unwrap());
        assert_eq!(before, PINGS.load(Ordering::SeqCst));
    }
}
