//! Hydrated records and typed collections

use std::ops::{Deref, DerefMut};

use mtdb_core::query::Field;
use mtdb_core::{Id, Resource};
use serde::Serialize;
use serde_json::Value;

use crate::api::resource::create_record;
use crate::client::{ClientHandle, MtdbClient};
use crate::error::{ClientError, Result};

/// A model fetched from (or created on) the server
///
/// Dereferences to the model. The attached [`ClientHandle`] is only used for
/// follow-up reads such as relationship traversal.
#[derive(Debug, Clone)]
pub struct Record<T> {
    model: T,
    handle: ClientHandle,
}

impl<T> Record<T> {
    pub fn new(model: T, handle: ClientHandle) -> Self {
        Self { model, handle }
    }

    /// Record not bound to any client
    pub fn detached(model: T) -> Self {
        Self::new(model, ClientHandle::detached())
    }

    pub fn model(&self) -> &T {
        &self.model
    }

    pub fn into_inner(self) -> T {
        self.model
    }

    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Client the record was fetched with
    pub fn client(&self) -> Result<MtdbClient> {
        self.handle.client()
    }

    /// Apply `f` to the model, keeping the handle
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            model: f(self.model),
            handle: self.handle,
        }
    }
}

impl<T: Resource> Record<T> {
    /// Server-assigned id; errors for records that were never persisted
    pub fn require_id(&self) -> Result<Id> {
        self.model
            .id()
            .ok_or(ClientError::NotPersisted(<T::Field as Field>::RESOURCE))
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.model
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.model
    }
}

/// Records compare by model only
impl<T: PartialEq> PartialEq for Record<T> {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model
    }
}

impl<T: PartialEq> PartialEq<T> for Record<T> {
    fn eq(&self, other: &T) -> bool {
        &self.model == other
    }
}

/// An ordered page of records of one kind
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<Record<T>>,
    handle: ClientHandle,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            handle: ClientHandle::detached(),
        }
    }
}

impl<T: Resource> Collection<T> {
    pub fn new(handle: ClientHandle) -> Self {
        Self {
            items: Vec::new(),
            handle,
        }
    }

    pub fn from_records(items: Vec<Record<T>>, handle: ClientHandle) -> Self {
        Self { items, handle }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record<T>> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Record<T>> {
        self.items.first()
    }

    pub fn records(&self) -> &[Record<T>] {
        &self.items
    }

    pub fn into_records(self) -> Vec<Record<T>> {
        self.items
    }

    /// Plain models, dropping the client handles
    pub fn into_models(self) -> Vec<T> {
        self.items.into_iter().map(Record::into_inner).collect()
    }

    /// Linear scan for `id` within this page (no request)
    pub fn get_by_id(&self, id: Id) -> Option<&Record<T>> {
        self.items.iter().find(|r| r.id() == Some(id))
    }

    /// Copy of the records matching `predicate`
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Self {
        Self {
            items: self.items.iter().filter(|r| predicate(r)).cloned().collect(),
            handle: self.handle.clone(),
        }
    }

    /// Keep only the records matching `predicate`
    pub fn retain(&mut self, predicate: impl Fn(&T) -> bool) {
        self.items.retain(|r| predicate(r));
    }

    /// Copy of the records whose serialized `field` equals `value`
    pub fn filter_eq(&self, field: T::Field, value: impl Serialize) -> Result<Self> {
        let matcher = AttributeMatcher::new(field.as_str(), value)?;
        Ok(self.filter(|model| matcher.matches(model)))
    }

    /// In-place variant of [`Collection::filter_eq`]
    pub fn retain_eq(&mut self, field: T::Field, value: impl Serialize) -> Result<()> {
        let matcher = AttributeMatcher::new(field.as_str(), value)?;
        self.retain(|model| matcher.matches(model));
        Ok(())
    }

    /// The single record, `None` when empty, an error when there are several
    pub fn scalar(&self) -> Result<Option<&Record<T>>> {
        match self.items.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(one)),
            many => Err(ClientError::NotScalar {
                resource: <T::Field as Field>::RESOURCE,
                count: many.len(),
            }),
        }
    }

    /// Owned variant of [`Collection::scalar`]
    pub fn into_scalar(mut self) -> Result<Option<Record<T>>> {
        if self.items.len() > 1 {
            return Err(ClientError::NotScalar {
                resource: <T::Field as Field>::RESOURCE,
                count: self.items.len(),
            });
        }
        Ok(self.items.pop())
    }

    /// Add a record, creating it on the server first if it has no id
    pub async fn append(&mut self, item: T) -> Result<&Record<T>> {
        let record = if item.id().is_some() {
            Record::new(item, self.handle.clone())
        } else {
            let client = self.handle.client()?;
            create_record(&client, &item).await?
        };
        self.items.push(record);
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = Record<T>;
    type IntoIter = std::vec::IntoIter<Record<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Record<T>;
    type IntoIter = std::slice::Iter<'a, Record<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Attribute-equality test over the serialized form of a model
struct AttributeMatcher {
    name: &'static str,
    expected: Value,
}

impl AttributeMatcher {
    fn new(name: &'static str, value: impl Serialize) -> Result<Self> {
        Ok(Self {
            name,
            expected: serde_json::to_value(value)?,
        })
    }

    fn matches<T: Serialize>(&self, model: &T) -> bool {
        serde_json::to_value(model)
            .ok()
            .and_then(|v| v.get(self.name).cloned())
            .map_or(self.expected.is_null(), |actual| {
                values_equal(&actual, &self.expected)
            })
    }
}

/// JSON equality that treats `1` and `1.0` as the same number
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtdb_core::query::fields::SensorField;
    use mtdb_core::{Sensor, SensorKind};
    use pretty_assertions::assert_eq;

    fn sensor(id: Id, name: &str, kind: SensorKind) -> Record<Sensor> {
        let mut sensor = Sensor::new(name, 1, kind, "m");
        sensor.id = Some(id);
        Record::detached(sensor)
    }

    fn sample() -> Collection<Sensor> {
        Collection::from_records(
            vec![
                sensor(1, "wave probe 1", SensorKind::Length),
                sensor(2, "wave probe 2", SensorKind::Length),
                sensor(3, "mooring line 1", SensorKind::Force),
            ],
            ClientHandle::detached(),
        )
    }

    #[test]
    fn test_get_by_id_is_local() {
        let sensors = sample();
        assert_eq!(sensors.get_by_id(2).map(|s| s.name.as_str()), Some("wave probe 2"));
        assert!(sensors.get_by_id(42).is_none());
    }

    #[test]
    fn test_filter_eq_copy_and_in_place() {
        let mut sensors = sample();
        let probes = sensors.filter_eq(SensorField::Kind, SensorKind::Length).unwrap();
        assert_eq!(probes.len(), 2);
        assert_eq!(sensors.len(), 3);

        sensors.retain_eq(SensorField::Id, 3.0).unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors.first().map(|s| s.name.as_str()), Some("mooring line 1"));

        let none = sample().filter_eq(SensorField::Area, Option::<f64>::None).unwrap();
        assert_eq!(none.len(), 3);
    }

    #[test]
    fn test_scalar() {
        assert!(Collection::<Sensor>::default().scalar().unwrap().is_none());

        let single = sample().filter(|s| s.id == Some(1));
        assert_eq!(single.scalar().unwrap().and_then(|s| s.id), Some(1));

        let err = sample().scalar().unwrap_err();
        assert!(matches!(err, ClientError::NotScalar { resource: "sensor", count: 3 }));
        assert!(sample().into_scalar().is_err());
    }

    #[test]
    fn test_record_equality_ignores_handle() {
        let a = sensor(1, "wave probe 1", SensorKind::Length);
        let b = Record::new(a.model().clone(), ClientHandle::detached());
        assert_eq!(a, b);
        assert!(a == *b.model());
        assert!(matches!(a.client(), Err(ClientError::ClientDropped)));
    }

    #[tokio::test]
    async fn test_append_persisted_item_without_client() {
        let mut sensors = Collection::<Sensor>::new(ClientHandle::detached());
        let existing = sensor(9, "heave", SensorKind::Length).into_inner();
        sensors.append(existing).await.unwrap();
        assert_eq!(sensors.len(), 1);

        // Unpersisted items need a live client to be created
        let fresh = Sensor::new("pitch", 1, SensorKind::Angle, "deg");
        assert!(matches!(
            sensors.append(fresh).await,
            Err(ClientError::ClientDropped)
        ));
        assert_eq!(sensors.len(), 1);
    }
}
