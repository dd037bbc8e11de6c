use proptest::prelude::*;

use service_bus::constants::work_types;

/// Small pool of work types so registrations and items collide often
pub const WORK_TYPE_POOL: &[&str] = &["user.created", "order.placed", "invoice.sent"];

/// Strategy for concrete work type names drawn from the pool
pub fn concrete_work_type_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(WORK_TYPE_POOL)
}

/// Strategy for registration keys: a pooled concrete type or the wildcard
pub fn registration_key_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        3 => concrete_work_type_strategy(),
        1 => Just(work_types::ALL),
    ]
}

/// One handler registration: the key it is registered under and whether it returns a result
#[derive(Debug, Clone)]
pub struct Registration {
    pub key: &'static str,
    pub returns_result: bool,
}

/// Strategy for a batch of handler registrations
pub fn registrations_strategy() -> impl Strategy<Value = Vec<Registration>> {
    prop::collection::vec(
        (registration_key_strategy(), any::<bool>())
            .prop_map(|(key, returns_result)| Registration { key, returns_result }),
        0..24,
    )
}

/// Strategy for arbitrary, possibly unregistered, work type names
pub fn work_type_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,31}"
}
