//! Generic CRUD over one resource endpoint

use std::marker::PhantomData;

use mtdb_core::query::{Field, Filter, FilterOp, Query};
use mtdb_core::{Id, Named, Numbered, Resource};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::client::MtdbClient;
use crate::collection::{Collection, Record};
use crate::config::MatchPolicy;
use crate::error::{ClientError, Result};
use crate::transport::Params;

/// Operations on the collection endpoint of `T`
pub struct ResourceApi<T> {
    client: MtdbClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceApi<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> ResourceApi<T> {
    pub(crate) fn new(client: MtdbClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    pub fn client(&self) -> &MtdbClient {
        &self.client
    }

    /// One page of records, filtered and sorted server-side
    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn get(&self, query: &Query<T::Field>) -> Result<Collection<T>> {
        let rows: Vec<Value> = self.client.transport().get(T::PATH, query_params(query)).await?;
        debug!("Fetched {} {} records", rows.len(), T::PATH);

        let records = rows
            .into_iter()
            .map(|row| hydrate::<T>(&self.client, T::PATH, row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Collection::from_records(records, self.client.handle()))
    }

    /// First page with the server's default size
    pub async fn all(&self) -> Result<Collection<T>> {
        self.get(&Query::new()).await
    }

    /// Fetch one record by primary key
    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn get_by_id(&self, id: Id) -> Result<Record<T>> {
        let path = format!("{}/{}", T::PATH, id);
        let row: Value = self.client.transport().get(&path, Vec::new()).await?;
        hydrate(&self.client, &path, row)
    }

    /// Single record matching `filter`, resolved by the match policy
    pub async fn find_one(&self, filter: Filter<T::Field>) -> Result<Option<Record<T>>> {
        let clause = filter.clause();
        let matches = self.get(&Query::new().filter(filter)).await?;
        pick(self.client.config().match_policy, matches, &clause)
    }

    /// Persist a new record; records that already have an id are returned as-is
    pub async fn create(&self, item: &T) -> Result<Record<T>> {
        create_record(&self.client, item).await
    }

    /// Replace the stored record with `item`
    pub async fn update(&self, item: &T) -> Result<Record<T>> {
        update_record(&self.client, item).await
    }

    pub async fn delete(&self, item: &T) -> Result<()> {
        delete_record(&self.client, item).await
    }
}

impl<T: Named> ResourceApi<T> {
    /// Record named `name`; several matches are resolved by the match policy
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Record<T>>> {
        self.find_one(Filter::new(T::NAME_FIELD, FilterOp::Eq, name))
            .await
    }
}

impl<T: Numbered> ResourceApi<T> {
    /// Test with run number `number`
    pub async fn get_by_number(&self, number: &str) -> Result<Option<Record<T>>> {
        self.find_one(Filter::new(T::NUMBER_FIELD, FilterOp::Eq, number))
            .await
    }
}

pub(crate) fn query_params<F: Field>(query: &Query<F>) -> Params {
    query
        .params()
        .into_iter()
        .map(|(k, v)| (k, Some(v)))
        .collect()
}

pub(crate) fn hydrate<T: Resource>(client: &MtdbClient, path: &str, row: Value) -> Result<Record<T>> {
    let model = serde_json::from_value(row).map_err(|e| parse_error(client, path, e))?;
    Ok(Record::new(model, client.handle()))
}

pub(crate) fn parse_error(client: &MtdbClient, path: &str, e: serde_json::Error) -> ClientError {
    malformed(client, path, e.to_string())
}

/// Parse error for a body from `path`, reported against its absolute URL
pub(crate) fn malformed(client: &MtdbClient, path: &str, message: impl Into<String>) -> ClientError {
    let url = client
        .transport()
        .url(path, &Vec::new())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| path.to_string());
    ClientError::Parse {
        url,
        message: message.into(),
    }
}

/// Resolve several lookup matches according to `policy`
pub(crate) fn pick<T: Resource>(
    policy: MatchPolicy,
    matches: Collection<T>,
    filter: &str,
) -> Result<Option<Record<T>>> {
    let resource = <T::Field as Field>::RESOURCE;
    let count = matches.len();
    if count > 1 {
        match policy {
            MatchPolicy::WarnFirst => {
                warn!("{} {} records match {}, using the first", count, resource, filter);
            }
            MatchPolicy::Strict => {
                return Err(ClientError::Ambiguous {
                    resource,
                    filter: filter.to_string(),
                    count,
                });
            }
        }
    }
    Ok(matches.into_records().into_iter().next())
}

/// Parameters of a write to an existing record
fn write_params<T: Resource>(client: &MtdbClient, item: &T, id: Id) -> Result<Params> {
    let admin_key = client.transport().admin_key();
    if item.read_only() && admin_key.is_none() {
        return Err(ClientError::ReadOnly {
            resource: <T::Field as Field>::RESOURCE,
            id,
        });
    }
    Ok(vec![("secret_key", admin_key.map(str::to_string))])
}

fn require_id<T: Resource>(item: &T) -> Result<Id> {
    item.id()
        .ok_or(ClientError::NotPersisted(<T::Field as Field>::RESOURCE))
}

pub(crate) async fn create_record<T: Resource>(client: &MtdbClient, item: &T) -> Result<Record<T>> {
    if item.id().is_some() {
        return Ok(Record::new(item.clone(), client.handle()));
    }
    item.validate()?;

    let path = item.endpoint();
    let row: Value = client.transport().post(path, Vec::new(), item).await?;
    let model = item.hydrate(row).map_err(|e| parse_error(client, path, e))?;
    debug!(id = ?model.id(), "Created {} record", path);
    Ok(Record::new(model, client.handle()))
}

pub(crate) async fn update_record<T: Resource>(client: &MtdbClient, item: &T) -> Result<Record<T>> {
    let id = require_id(item)?;
    item.validate()?;
    let params = write_params(client, item, id)?;

    let path = format!("{}/{}", item.endpoint(), id);
    let row: Value = client.transport().patch(&path, params, item).await?;
    client.invalidate(&format!("{}/", path));
    let model = item.hydrate(row).map_err(|e| parse_error(client, &path, e))?;
    Ok(Record::new(model, client.handle()))
}

pub(crate) async fn delete_record<T: Resource>(client: &MtdbClient, item: &T) -> Result<()> {
    let id = require_id(item)?;
    let params = write_params(client, item, id)?;

    let path = format!("{}/{}", item.endpoint(), id);
    client.transport().delete(&path, params).await?;
    client.invalidate(&format!("{}/", path));
    debug!("Deleted {}", path);
    Ok(())
}
