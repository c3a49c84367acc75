//! Deferred values resolved by the orchestration engine after apply.

use serde::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// A value that only exists once the engine has applied the graph, such as a
/// Cloud Run service URL or a forwarding rule IP.
///
/// `Output` deliberately has no accessor for the underlying value. It can be
/// passed into other descriptors, where it serializes as an interpolation
/// token (`${resource.attribute}`) for the engine to substitute.
pub struct Output<T> {
    resource: String,
    attribute: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> Output<T> {
    pub(crate) fn of(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self { resource: resource.into(), attribute: attribute.into(), _value: PhantomData }
    }

    /// Logical name of the resource that produces this value
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Attribute of the resource that will hold the value
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Engine interpolation token, e.g. `${shop-backend.uri}`
    pub fn interpolation(&self) -> String {
        format!("${{{}.{}}}", self.resource, self.attribute)
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self::of(self.resource.clone(), self.attribute.clone())
    }
}

impl<T> PartialEq for Output<T> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && self.attribute == other.attribute
    }
}

impl<T> Eq for Output<T> {}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({})", self.interpolation())
    }
}

impl<T> Serialize for Output<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.interpolation())
    }
}
