//! Typed record identifiers, as handed over by the external registries.

macro_rules! identifier {
    ($name:ident) => {
        #[must_use]
        #[derive(
            Copy,
            Clone,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            ::derive_more::Display,
            ::derive_more::From,
            ::derive_more::FromStr,
            ::serde::Deserialize,
            ::serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);
    };
}

identifier!(VehicleId);
identifier!(VehicleTypeId);
identifier!(DepotId);
identifier!(EventId);
