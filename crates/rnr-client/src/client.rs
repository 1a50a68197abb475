use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use rnr_core::{FetchError, TaskSource};
use rnr_model::{FetchedTask, TaskState, TasksVersion};
use rnr_report::{LogBatch, ReportError, ReportSink};

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::proto::{
    DeclareRequest, DeclareResponse, ErrorBody, FetchTaskRequest, FetchTaskResponse,
    SERVICE_PATH, UpdateLogRequest, UpdateLogResponse, UpdateTaskRequest, UpdateTaskResponse,
};

const UUID_HEADER: &str = "x-runner-uuid";
const TOKEN_HEADER: &str = "x-runner-token";

/// Runner-side handle to the orchestrator.
///
/// Cheap to share: the underlying `reqwest::Client` pools connections.
#[derive(Clone, Debug)]
pub struct RunnerClient {
    http: reqwest::Client,
    base: String,
    cfg: ClientConfig,
}

impl RunnerClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.insecure)
            .build()?;
        let base = format!("{}/{}", cfg.address.trim_end_matches('/'), SERVICE_PATH);
        Ok(Self { http, base, cfg })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    /// Announce this runner's version and labels.
    pub async fn declare(&self, labels: Vec<String>) -> Result<DeclareResponse, ClientError> {
        let req = DeclareRequest {
            version: self.cfg.version.clone(),
            labels,
        };
        self.call("Declare", &req).await
    }

    pub async fn fetch(&self, tasks_version: TasksVersion) -> Result<FetchTaskResponse, ClientError> {
        self.call("FetchTask", &FetchTaskRequest { tasks_version })
            .await
    }

    pub async fn update_log(&self, req: &UpdateLogRequest) -> Result<UpdateLogResponse, ClientError> {
        self.call("UpdateLog", req).await
    }

    pub async fn update_task(
        &self,
        req: &UpdateTaskRequest,
    ) -> Result<UpdateTaskResponse, ClientError> {
        self.call("UpdateTask", req).await
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn call<Req, Resp>(&self, method: &str, req: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        trace!(method, "rpc call");
        let response = self
            .http
            .post(self.url(method))
            .header("connect-protocol-version", "1")
            .header(UUID_HEADER, &self.cfg.uuid)
            .header(TOKEN_HEADER, &self.cfg.token)
            .json(req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode(status, &body)
    }
}

fn decode<Resp: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Resp, ClientError> {
    if status.is_success() {
        return serde_json::from_str(body).map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
        });
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.code.is_empty() => Err(ClientError::Rpc {
            code: err.code,
            message: err.message,
        }),
        _ => Err(ClientError::InvalidResponse(format!(
            "http status {status}, body: {body}"
        ))),
    }
}

#[async_trait]
impl TaskSource for RunnerClient {
    async fn fetch_task(&self, tasks_version: TasksVersion) -> Result<FetchedTask, FetchError> {
        let resp = self.fetch(tasks_version).await?;
        Ok(FetchedTask {
            task: resp.task,
            tasks_version: resp.tasks_version,
        })
    }
}

#[async_trait]
impl ReportSink for RunnerClient {
    async fn upload_logs(&self, batch: LogBatch) -> Result<u64, ReportError> {
        let rows = batch.rows.len();
        let req = UpdateLogRequest {
            task_id: batch.task_id,
            index: batch.index as i64,
            rows: batch.rows,
            no_more: batch.no_more,
        };
        let resp = self.update_log(&req).await?;
        debug!(task_id = req.task_id, rows, ack = resp.ack_index, "logs uploaded");
        u64::try_from(resp.ack_index)
            .map_err(|_| ReportError::Upload(format!("negative ack index {}", resp.ack_index)))
    }

    async fn update_state(&self, state: TaskState) -> Result<(), ReportError> {
        let req = UpdateTaskRequest {
            state,
            outputs: HashMap::new(),
        };
        self.update_task(&req).await?;
        Ok(())
    }
}
