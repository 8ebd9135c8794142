//! Records exchanged with the server.
//!
//! Field names follow the server's JSON, including its spelling
//! (`maxResponce`, `maxConcurentConnection`).

use crate::session::Redacted;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

// ============================================================================
// Statistics
// ============================================================================

/// Server statistics snapshot. Each fetch replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatistics {
    pub version: String,
    /// Longest single connection, nanoseconds.
    #[serde(rename = "oneConnectionTimeout")]
    pub one_connection_timeout: i64,
    /// Longest response time, nanoseconds.
    #[serde(rename = "maxResponce")]
    pub max_response: f64,
    #[serde(rename = "timeUP")]
    pub time_up: Option<DateTime<Utc>>,
    #[serde(rename = "nowConnected")]
    pub now_connected: i64,
    #[serde(rename = "maxConcurentConnection")]
    pub max_concurrent_connection: i64,
    #[serde(rename = "allConnection")]
    pub all_connection: i64,
    /// Per-address history keyed by address.
    #[serde(rename = "allIP", deserialize_with = "de_ip_table")]
    pub all_ip: BTreeMap<String, IpActivity>,
}

impl ServerStatistics {
    /// Longest single connection.
    pub fn one_connection_timeout(&self) -> Duration {
        nanos(self.one_connection_timeout)
    }

    /// Longest response time.
    pub fn max_response_time(&self) -> Duration {
        if self.max_response.is_finite() && self.max_response > 0.0 {
            Duration::from_nanos(self.max_response as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Time since `timeUP`, if the server reported it.
    pub fn uptime(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.time_up.and_then(|up| (now - up).to_std().ok())
    }

    /// Address history ordered by address.
    pub fn ip_activity(&self) -> impl Iterator<Item = &IpActivity> {
        self.all_ip.values()
    }
}

/// Connection history of one remote address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpActivity {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Count", default)]
    pub count: Option<u32>,
    #[serde(rename = "LastTime", default)]
    pub last_time: Option<DateTime<Utc>>,
}

// The server has emitted both an address-keyed object and a bare array here.
#[derive(Deserialize)]
#[serde(untagged)]
enum IpTable {
    Map(HashMap<String, IpActivity>),
    List(Vec<IpActivity>),
}

fn de_ip_table<'de, D>(deserializer: D) -> Result<BTreeMap<String, IpActivity>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IpTable>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(IpTable::Map(map)) => map
            .into_iter()
            .map(|(addr, mut rec)| {
                if rec.ip.is_empty() {
                    rec.ip = addr.clone();
                }
                (addr, rec)
            })
            .collect(),
        Some(IpTable::List(list)) => list.into_iter().map(|rec| (rec.ip.clone(), rec)).collect(),
    })
}

fn nanos(ns: i64) -> Duration {
    Duration::from_nanos(ns.max(0) as u64)
}

// ============================================================================
// Authentication
// ============================================================================

/// Successful `checkKey` reply.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckKeyReply {
    pub key: String,
    pub name: String,
}

impl fmt::Debug for CheckKeyReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckKeyReply")
            .field("key", &Redacted(&self.key))
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Clients
// ============================================================================

/// Registered messaging client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Key", default)]
    pub secret_key: String,
    #[serde(rename = "Registered", default)]
    pub registered: Option<DateTime<Utc>>,
}

impl fmt::Debug for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret_key", &Redacted(&self.secret_key))
            .field("registered", &self.registered)
            .finish()
    }
}

/// How to address one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    Id(u64),
    Name(String),
}

impl ClientRef {
    pub(crate) fn to_param(&self) -> crate::gateway::Param {
        match self {
            ClientRef::Id(id) => crate::gateway::Param::new("id", id.to_string()),
            ClientRef::Name(name) => crate::gateway::Param::new("name", name.as_str()),
        }
    }
}

/// Traffic limits and counters of one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientLimits {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "LastActivity")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(rename = "Transmit")]
    pub transmitted_bytes: u64,
    #[serde(rename = "Receive")]
    pub received_bytes: u64,
    #[serde(rename = "MaxRx")]
    pub max_received_bytes: u64,
    #[serde(rename = "MaxTx")]
    pub max_transmitted_bytes: u64,
    #[serde(rename = "LimitExpiration")]
    pub limit_expiration: Option<DateTime<Utc>>,
    /// Limit window, nanoseconds.
    #[serde(rename = "Period")]
    pub period: i64,
    #[serde(rename = "Balance")]
    pub balance: f64,
    #[serde(rename = "Rate")]
    pub rate: f64,
}

impl ClientLimits {
    pub fn period(&self) -> Duration {
        nanos(self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats_json() -> serde_json::Value {
        json!({
            "version": "v2.3.0",
            "oneConnectionTimeout": 125_000_000_000i64,
            "maxResponce": 2_500_000,
            "timeUP": "2020-03-01T10:00:00.123456789+02:00",
            "nowConnected": 3,
            "maxConcurentConnection": 17,
            "allConnection": 420,
            "allIP": {
                "10.0.0.2": {"IP": "10.0.0.2", "Count": 4, "LastTime": "2020-03-01T12:00:00Z"},
                "10.0.0.1": {"IP": "10.0.0.1"}
            }
        })
    }

    #[test]
    fn test_statistics_from_server_json() {
        let stats: ServerStatistics = serde_json::from_value(stats_json()).unwrap();

        assert_eq!(stats.version, "v2.3.0");
        assert_eq!(stats.one_connection_timeout().as_secs(), 125);
        assert_eq!(stats.max_response_time(), Duration::from_micros(2500));
        assert_eq!(stats.now_connected, 3);
        assert_eq!(stats.max_concurrent_connection, 17);
        assert_eq!(stats.all_connection, 420);
        assert_eq!(
            stats.time_up.unwrap().to_rfc3339(),
            "2020-03-01T08:00:00.123456789+00:00"
        );

        let ips: Vec<_> = stats.ip_activity().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, ["10.0.0.1", "10.0.0.2"]);
        assert_eq!(stats.all_ip["10.0.0.2"].count, Some(4));
        assert_eq!(stats.all_ip["10.0.0.1"].count, None);
    }

    #[test]
    fn test_statistics_ip_list_shape() {
        let stats: ServerStatistics = serde_json::from_value(json!({
            "version": "v2.3.0",
            "allIP": [{"IP": "192.168.1.7"}, {"IP": "192.168.1.3"}]
        }))
        .unwrap();

        assert_eq!(stats.all_ip.len(), 2);
        assert!(stats.all_ip.contains_key("192.168.1.7"));
    }

    #[test]
    fn test_statistics_missing_fields() {
        let stats: ServerStatistics = serde_json::from_value(json!({"allIP": null})).unwrap();
        assert_eq!(stats, ServerStatistics::default());
        assert_eq!(stats.uptime(Utc::now()), None);
    }

    #[test]
    fn test_uptime() {
        let stats: ServerStatistics = serde_json::from_value(stats_json()).unwrap();
        let now = stats.time_up.unwrap() + chrono::Duration::hours(2);
        assert_eq!(stats.uptime(now), Some(Duration::from_secs(7200)));
    }

    #[test]
    fn test_negative_durations_clamp() {
        let stats = ServerStatistics {
            one_connection_timeout: -5,
            max_response: f64::NAN,
            ..Default::default()
        };
        assert_eq!(stats.one_connection_timeout(), Duration::ZERO);
        assert_eq!(stats.max_response_time(), Duration::ZERO);
    }

    #[test]
    fn test_client_descriptor() {
        let client: ClientDescriptor = serde_json::from_value(json!({
            "ID": 12,
            "Name": "blabu",
            "Key": "hunter22",
            "Registered": "2020-01-05T09:30:00Z"
        }))
        .unwrap();

        assert_eq!(client.id, 12);
        assert_eq!(client.name, "blabu");
        assert!(!format!("{:?}", client).contains("hunter22"));
    }

    #[test]
    fn test_client_limits() {
        let limits: ClientLimits = serde_json::from_value(json!({
            "ID": 12,
            "Transmit": 100,
            "Receive": 200,
            "MaxRx": 1000,
            "Period": 3_600_000_000_000i64,
            "Balance": -20.3,
            "Rate": 100.0
        }))
        .unwrap();

        assert_eq!(limits.period(), Duration::from_secs(3600));
        assert_eq!(limits.max_received_bytes, 1000);
        assert_eq!(limits.balance, -20.3);
        assert!(limits.last_activity.is_none());
    }

    #[test]
    fn test_client_ref_param() {
        assert_eq!(ClientRef::Id(7).to_param().value, "7");
        assert_eq!(ClientRef::Name("blabu".into()).to_param().key, "name");
    }
}
