use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{UdirConfig, UdirError};
use crate::model::Record;

// Remote shape of https://randomuser.me/api/. Only the fields the table
// renders are kept; everything is optional so a short payload degrades to
// blank cells instead of a decode failure.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    results: Vec<ApiUser>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUser {
    #[serde(default)]
    name: ApiName,
    #[serde(default)]
    dob: ApiDob,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    location: ApiLocation,
}

#[derive(Debug, Default, Deserialize)]
struct ApiName {
    #[serde(default)]
    first: String,
    #[serde(default)]
    last: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiDob {
    #[serde(default)]
    age: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLocation {
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: String,
}

fn normalize(results: Vec<ApiUser>) -> Vec<Record> {
    results
        .into_iter()
        .enumerate()
        .map(|(idx, user)| Record {
            id: idx as u32 + 1,
            name: user.name.first,
            surname: user.name.last,
            age: user.dob.age,
            gender: user.gender,
            country: user.location.country,
            state: user.location.state,
        })
        .collect()
}

async fn fetch_batch(config: &UdirConfig) -> Result<Vec<Record>, UdirError> {
    let url = format!("{}?results={}", config.endpoint, config.batch_size);
    debug!("Requesting {url}");

    let response = reqwest::get(&url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(UdirError::BadStatus {
            status: status.as_u16(),
        });
    }

    let body: ApiResponse = response.json().await?;
    let records = normalize(body.results);
    info!("Fetched {} records from {}", records.len(), config.endpoint);
    Ok(records)
}

/// Handle to the one in-flight directory fetch. The result arrives over a
/// oneshot channel polled by the draw loop; dropping the handle aborts the
/// task, so a teardown before completion cannot write into a dead model.
pub struct FetchHandle {
    rx: oneshot::Receiver<Result<Vec<Record>, UdirError>>,
    task: JoinHandle<()>,
}

impl FetchHandle {
    pub fn spawn(config: &UdirConfig) -> Self {
        let (tx, rx) = oneshot::channel();
        let config = config.clone();
        let task = tokio::spawn(async move {
            let batch = fetch_batch(&config).await;
            // Receiver gone means the ui was torn down; discard silently.
            let _ = tx.send(batch);
        });
        Self { rx, task }
    }

    /// Non-blocking; yields the batch exactly once when it has arrived.
    pub fn poll(&mut self) -> Option<Result<Vec<Record>, UdirError>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_assigns_sequential_ids() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"results": [
                {"name": {"first": "Ana", "last": "Lee"},
                 "dob": {"age": 30, "date": "1994-01-01"},
                 "gender": "female",
                 "location": {"country": "Norway", "state": "Troms"}},
                {"name": {"first": "Bob", "last": "Zed"},
                 "dob": {"age": 25},
                 "gender": "male",
                 "location": {"country": "Chile", "state": "Biobio"}}
            ]}"#,
        )
        .unwrap();

        let records = normalize(body.results);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[0].name, "Ana");
        assert_eq!(records[1].age, 25);
        assert_eq!(records[1].country, "Chile");
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"results": [
                {"gender": "female"},
                {"name": {"first": "Solo"}, "location": {"country": "Peru"}}
            ]}"#,
        )
        .unwrap();

        let records = normalize(body.results);
        assert_eq!(records[0].name, "");
        assert_eq!(records[0].age, 0);
        assert_eq!(records[0].gender, "female");
        assert_eq!(records[1].surname, "");
        assert_eq!(records[1].country, "Peru");
        assert_eq!(records[1].state, "");
    }

    #[test]
    fn unexpected_payload_shape_yields_no_records() {
        let body: ApiResponse = serde_json::from_str(r#"{"info": {"page": 1}}"#).unwrap();
        assert!(normalize(body.results).is_empty());
    }
}
