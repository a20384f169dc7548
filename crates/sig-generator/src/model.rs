use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Inbound deployment descriptor. Only the image reference is inspected;
/// everything else travels in the raw body that gets signed.
///
/// Keys are matched case-insensitively and the last occurrence of a key
/// wins. A repeated object key merges into the earlier object, and a `null`
/// value leaves the field as it was. Unknown keys are skipped.
#[derive(Debug, Clone, Default)]
pub struct Deployment {
    pub services: Option<Services>,
}

#[derive(Debug, Clone, Default)]
pub struct Services {
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default)]
pub struct Location {
    pub image: Option<String>,
}

impl Deployment {
    /// The image reference, or `None` when absent, null or empty.
    pub fn image(&self) -> Option<&str> {
        self.services
            .as_ref()?
            .location
            .as_ref()?
            .image
            .as_deref()
            .filter(|image| !image.is_empty())
    }
}

/// An object shape with one inspected key.
trait SingleKeyObject: Default {
    const NAME: &'static str;
    const KEY: &'static str;
    type Value: DeserializeOwned;

    fn set(&mut self, value: Self::Value);

    /// Fold a later occurrence of the same object into this one.
    fn merge(&mut self, other: Self);
}

impl SingleKeyObject for Deployment {
    const NAME: &'static str = "struct Deployment";
    const KEY: &'static str = "services";
    type Value = Services;

    fn set(&mut self, value: Services) {
        self.services.get_or_insert_with(Services::default).merge(value);
    }

    fn merge(&mut self, other: Self) {
        if let Some(services) = other.services {
            self.set(services);
        }
    }
}

impl SingleKeyObject for Services {
    const NAME: &'static str = "struct Services";
    const KEY: &'static str = "location";
    type Value = Location;

    fn set(&mut self, value: Location) {
        self.location.get_or_insert_with(Location::default).merge(value);
    }

    fn merge(&mut self, other: Self) {
        if let Some(location) = other.location {
            self.set(location);
        }
    }
}

impl SingleKeyObject for Location {
    const NAME: &'static str = "struct Location";
    const KEY: &'static str = "image";
    type Value = String;

    fn set(&mut self, value: String) {
        self.image = Some(value);
    }

    fn merge(&mut self, other: Self) {
        if let Some(image) = other.image {
            self.set(image);
        }
    }
}

struct SingleKeyVisitor<T>(PhantomData<T>);

impl<'de, T: SingleKeyObject> Visitor<'de> for SingleKeyVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(T::NAME)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<T, A::Error> {
        let mut object = T::default();
        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case(T::KEY) {
                if let Some(value) = map.next_value::<Option<T::Value>>()? {
                    object.set(value);
                }
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(object)
    }
}

fn deserialize_single_key<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: SingleKeyObject,
{
    deserializer.deserialize_map(SingleKeyVisitor(PhantomData))
}

impl<'de> Deserialize<'de> for Deployment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_single_key(deserializer)
    }
}

impl<'de> Deserialize<'de> for Services {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_single_key(deserializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_single_key(deserializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    #[serde(rename = "deploymentSignature")]
    pub deployment_signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}
