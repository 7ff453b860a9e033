use async_trait::async_trait;
use aws_sdk_route53::error::{BuildError, DisplayErrorContext};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client;
use log::debug;

use super::{DnsProvider, Error, RecordType, RecordUpsert};

/// Route 53 backed provider.
///
/// Credentials and region come from the usual AWS chain (environment,
/// shared profile, instance metadata).
#[derive(Debug, Clone)]
pub struct Route53Provider {
    client: Client,
}

impl Route53Provider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config))
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::InvalidChange(err.to_string())
    }
}

fn rr_type(record_type: RecordType) -> RrType {
    match record_type {
        RecordType::A => RrType::A,
    }
}

fn change_batch(change: &RecordUpsert) -> Result<ChangeBatch, Error> {
    let record = ResourceRecord::builder().value(&change.value).build()?;
    let record_set = ResourceRecordSet::builder()
        .name(&change.name)
        .r#type(rr_type(change.record_type))
        .ttl(change.ttl)
        .resource_records(record)
        .build()?;
    let upsert = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()?;

    Ok(ChangeBatch::builder().changes(upsert).build()?)
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn upsert_record(&self, change: &RecordUpsert) -> Result<String, Error> {
        let batch = change_batch(change)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(&change.zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Error::Api(DisplayErrorContext(&e).to_string()))?;

        debug!("Route 53 accepted change for {}: {:?}", change.name, output);
        Ok(format!("{output:?}"))
    }
}
