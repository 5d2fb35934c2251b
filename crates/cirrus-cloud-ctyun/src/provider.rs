//! Ctyun provider implementation

use crate::error::CtyunError;
use async_trait::async_trait;
use chrono::Utc;
use cirrus_cloud::{Provider, StateMap};
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const PROVIDER_NAME: &str = "ctyun";
const DEFAULT_REGION: &str = "cn-cd";

/// Resource kinds this provider supports
pub const SUPPORTED_KINDS: &[&str] = &[
    "VPC",
    "SecurityGroup",
    "Instance",
    "Database",
    "LoadBalancer",
    "Storage",
];

/// Ctyun cloud provider
///
/// Synthesizes resource state in-process and remembers it so later `get`
/// calls observe what an earlier `apply` created.
#[derive(Debug)]
pub struct CtyunProvider {
    region: String,
    resources: RwLock<HashMap<String, StateMap>>,
}

impl Default for CtyunProvider {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl CtyunProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            resources: RwLock::new(HashMap::new()),
        }
    }

    fn short_id(prefix: &str) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{}-{}", prefix, &hex[..12])
    }

    /// `metadata` sub-map of a spec, or empty
    fn metadata(spec: &StateMap) -> HashMap<String, Value> {
        spec.get("metadata")
            .and_then(|v| v.as_object())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// `spec` sub-map (resource details) of a spec, or empty
    fn details(spec: &StateMap) -> HashMap<String, Value> {
        spec.get("spec")
            .and_then(|v| v.as_object())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn str_or(map: &HashMap<String, Value>, key: &str, default: &str) -> String {
        map.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    }

    fn apply_vpc(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let vpc_id = Self::short_id("vpc");

        StateMap::from([
            ("vpc_id".to_string(), json!(vpc_id)),
            (
                "name".to_string(),
                json!(Self::str_or(&metadata, "name", &format!("vpc-{}", self.region))),
            ),
            (
                "cidr".to_string(),
                json!(Self::str_or(&details, "cidr", "10.0.0.0/16")),
            ),
            (
                "region".to_string(),
                json!(Self::str_or(&metadata, "region", &self.region)),
            ),
            (
                "env".to_string(),
                json!(Self::str_or(&metadata, "env", "prod")),
            ),
            ("status".to_string(), json!("available")),
            (
                "enable_dns".to_string(),
                details.get("enable_dns").cloned().unwrap_or(json!(true)),
            ),
            (
                "enable_dns_hostnames".to_string(),
                details
                    .get("enable_dns_hostnames")
                    .cloned()
                    .unwrap_or(json!(true)),
            ),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }

    fn apply_security_group(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let sg_id = Self::short_id("sg");

        StateMap::from([
            ("sg_id".to_string(), json!(sg_id)),
            (
                "name".to_string(),
                json!(Self::str_or(&metadata, "name", "security-group")),
            ),
            (
                "vpc_id".to_string(),
                metadata.get("vpc_id").cloned().unwrap_or(Value::Null),
            ),
            (
                "description".to_string(),
                json!(Self::str_or(&details, "description", "Security group")),
            ),
            (
                "rules".to_string(),
                details.get("rules").cloned().unwrap_or(json!([])),
            ),
            ("status".to_string(), json!("available")),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }

    fn apply_instance(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let instance_id = Self::short_id("i");

        let mut rng = rand::thread_rng();
        let private_ip = format!("10.0.{}.{}", rng.gen_range(0..255), rng.gen_range(0..255));

        StateMap::from([
            ("instance_id".to_string(), json!(instance_id)),
            (
                "name".to_string(),
                json!(Self::str_or(&metadata, "name", "instance")),
            ),
            (
                "image".to_string(),
                json!(Self::str_or(&details, "image", "ubuntu-20.04")),
            ),
            (
                "instance_type".to_string(),
                json!(Self::str_or(&details, "instance_type", "t3.medium")),
            ),
            (
                "count".to_string(),
                details.get("count").cloned().unwrap_or(json!(1)),
            ),
            (
                "vpc_id".to_string(),
                details.get("vpc_id").cloned().unwrap_or(Value::Null),
            ),
            (
                "security_group_ids".to_string(),
                details.get("security_group_ids").cloned().unwrap_or(json!([])),
            ),
            ("private_ip".to_string(), json!(private_ip)),
            // Public IPs are opt-in, never assigned by default
            ("public_ip".to_string(), Value::Null),
            ("status".to_string(), json!("running")),
            (
                "region".to_string(),
                json!(Self::str_or(&metadata, "region", &self.region)),
            ),
            (
                "env".to_string(),
                json!(Self::str_or(&metadata, "env", "prod")),
            ),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }

    fn apply_database(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let db_id = Self::short_id("db");

        let name = Self::str_or(&metadata, "name", "database");
        let engine = Self::str_or(&details, "engine", "mysql");
        let endpoint = format!("{}.{}.ctyun.cn", name, self.region);

        StateMap::from([
            ("db_id".to_string(), json!(db_id)),
            ("name".to_string(), json!(name)),
            ("engine".to_string(), json!(engine)),
            (
                "version".to_string(),
                json!(Self::str_or(&details, "version", "8.0")),
            ),
            (
                "instance_type".to_string(),
                json!(Self::str_or(&details, "instance_type", "db.t3.medium")),
            ),
            (
                "storage".to_string(),
                details.get("storage").cloned().unwrap_or(json!(100)),
            ),
            ("storage_type".to_string(), json!("gp2")),
            (
                "backup_retention".to_string(),
                details.get("backup_retention").cloned().unwrap_or(json!(7)),
            ),
            ("endpoint".to_string(), json!(endpoint)),
            ("port".to_string(), json!(db_port(&engine))),
            ("status".to_string(), json!("available")),
            (
                "env".to_string(),
                json!(Self::str_or(&metadata, "env", "prod")),
            ),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }

    fn apply_load_balancer(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let lb_id = Self::short_id("lb");

        let name = Self::str_or(&metadata, "name", "load-balancer");
        let dns_name = format!(
            "{}-{}.ctyun.cn",
            Self::str_or(&metadata, "name", "lb"),
            self.region
        );

        StateMap::from([
            ("lb_id".to_string(), json!(lb_id)),
            ("name".to_string(), json!(name)),
            ("dns_name".to_string(), json!(dns_name)),
            (
                "scheme".to_string(),
                json!(Self::str_or(&details, "scheme", "internet")),
            ),
            (
                "type".to_string(),
                json!(Self::str_or(&details, "type", "application")),
            ),
            (
                "listeners".to_string(),
                details.get("listeners").cloned().unwrap_or(json!([])),
            ),
            ("status".to_string(), json!("active")),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }

    fn apply_storage(&self, spec: &StateMap) -> StateMap {
        let metadata = Self::metadata(spec);
        let details = Self::details(spec);
        let storage_id = Self::short_id("storage");

        StateMap::from([
            ("storage_id".to_string(), json!(storage_id)),
            (
                "name".to_string(),
                json!(Self::str_or(&metadata, "name", "storage")),
            ),
            (
                "type".to_string(),
                json!(Self::str_or(&details, "type", "block")),
            ),
            (
                "size".to_string(),
                details.get("size").cloned().unwrap_or(json!(100)),
            ),
            (
                "unit".to_string(),
                json!(Self::str_or(&details, "unit", "GB")),
            ),
            (
                "iops".to_string(),
                details.get("iops").cloned().unwrap_or(json!(3000)),
            ),
            ("status".to_string(), json!("available")),
            ("created_at".to_string(), json!(Utc::now().to_rfc3339())),
        ])
    }
}

/// Key within a state map that carries a kind's generated identifier
fn id_key(kind: &str) -> Option<&'static str> {
    match kind {
        "VPC" => Some("vpc_id"),
        "SecurityGroup" => Some("sg_id"),
        "Instance" => Some("instance_id"),
        "Database" => Some("db_id"),
        "LoadBalancer" => Some("lb_id"),
        "Storage" => Some("storage_id"),
        _ => None,
    }
}

/// Default port for a database engine
fn db_port(engine: &str) -> u16 {
    match engine {
        "postgres" => 5432,
        "sqlserver" => 1433,
        "oracle" => 1521,
        // mysql, mariadb, and anything unknown
        _ => 3306,
    }
}

#[async_trait]
impl Provider for CtyunProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn apply(&self, kind: &str, spec: &StateMap) -> cirrus_cloud::Result<StateMap> {
        let declared = spec
            .get("provider")
            .and_then(|v| v.as_str())
            .unwrap_or(PROVIDER_NAME);
        if declared != PROVIDER_NAME {
            return Err(CtyunError::ProviderMismatch(declared.to_string()).into());
        }

        let state = match kind {
            "VPC" => self.apply_vpc(spec),
            "SecurityGroup" => self.apply_security_group(spec),
            "Instance" => self.apply_instance(spec),
            "Database" => self.apply_database(spec),
            "LoadBalancer" => self.apply_load_balancer(spec),
            "Storage" => self.apply_storage(spec),
            other => return Err(CtyunError::UnsupportedKind(other.to_string()).into()),
        };

        // Remember the state so get() can serve it later
        if let Some(id) = id_key(kind)
            .and_then(|key| state.get(key))
            .and_then(|v| v.as_str())
        {
            self.resources
                .write()
                .await
                .insert(id.to_string(), state.clone());
            tracing::debug!(kind = %kind, id = %id, "Applied ctyun resource");
        }

        Ok(state)
    }

    async fn get(&self, kind: &str, state: &StateMap) -> cirrus_cloud::Result<StateMap> {
        let key = id_key(kind).ok_or_else(|| CtyunError::UnsupportedKind(kind.to_string()))?;

        if let Some(id) = state.get(key).and_then(|v| v.as_str()) {
            if let Some(stored) = self.resources.read().await.get(id) {
                return Ok(stored.clone());
            }
        }
        // Unknown id: echo the caller's view back unchanged
        Ok(state.clone())
    }
}
