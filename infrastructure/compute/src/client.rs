use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use domain_batch::{
    exception::{ComputeError, ResourceKind},
    model::entity::{Job, JobSpec, Pool, PoolSpec, Task, TaskSpec},
    service::ComputeService,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::{
    auth::{BatchCredential, CanonicalRequest},
    dto::{
        BatchErrorDto, JobAddDto, JobDto, PoolAddDto, PoolDto, TaskAddCollectionDto,
        TaskAddCollectionResultDto, TaskDto, TaskListDto,
    },
};

const API_VERSION: &str = "2023-05-01.17.0";
const JSON_CONTENT_TYPE: &str = "application/json; odata=minimalmetadata";
/// Upper bound of one `addtaskcollection` request.
const MAX_TASKS_PER_REQUEST: usize = 100;

/// [`ComputeService`] over the batch REST api, authenticated with the account's shared key.
#[derive(typed_builder::TypedBuilder)]
pub struct BatchRestClient {
    client: Arc<reqwest::Client>,
    credential: BatchCredential,
}

#[async_trait]
impl ComputeService for BatchRestClient {
    async fn create_pool(&self, spec: &PoolSpec) -> Result<(), ComputeError> {
        let body = serde_json::to_vec(&PoolAddDto::from(spec)).map_err(anyhow::Error::from)?;
        self.call(
            Method::POST,
            self.endpoint(&["pools"])?,
            body,
            ResourceKind::Pool,
            &spec.id,
        )
        .await?;
        Ok(())
    }

    async fn get_pool(&self, pool_id: &str) -> Result<Pool, ComputeError> {
        let body = self
            .call(
                Method::GET,
                self.endpoint(&["pools", pool_id])?,
                vec![],
                ResourceKind::Pool,
                pool_id,
            )
            .await?;
        Ok(decode::<PoolDto>(&body)?.into())
    }

    async fn delete_pool(&self, pool_id: &str) -> Result<(), ComputeError> {
        self.call(
            Method::DELETE,
            self.endpoint(&["pools", pool_id])?,
            vec![],
            ResourceKind::Pool,
            pool_id,
        )
        .await?;
        Ok(())
    }

    async fn create_job(&self, spec: &JobSpec) -> Result<(), ComputeError> {
        let body = serde_json::to_vec(&JobAddDto::from(spec)).map_err(anyhow::Error::from)?;
        self.call(
            Method::POST,
            self.endpoint(&["jobs"])?,
            body,
            ResourceKind::Job,
            &spec.id,
        )
        .await?;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ComputeError> {
        let body = self
            .call(
                Method::GET,
                self.endpoint(&["jobs", job_id])?,
                vec![],
                ResourceKind::Job,
                job_id,
            )
            .await?;
        Ok(decode::<JobDto>(&body)?.into())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ComputeError> {
        self.call(
            Method::DELETE,
            self.endpoint(&["jobs", job_id])?,
            vec![],
            ResourceKind::Job,
            job_id,
        )
        .await?;
        Ok(())
    }

    async fn add_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<(), ComputeError> {
        let mut existing = vec![];
        for chunk in tasks.chunks(MAX_TASKS_PER_REQUEST) {
            let collection = TaskAddCollectionDto {
                value: chunk.iter().map(Into::into).collect(),
            };
            let body = serde_json::to_vec(&collection).map_err(anyhow::Error::from)?;
            let response = self
                .call(
                    Method::POST,
                    self.endpoint(&["jobs", job_id, "addtaskcollection"])?,
                    body,
                    ResourceKind::Job,
                    job_id,
                )
                .await?;
            // The collection call succeeds as a whole even when single tasks are refused.
            let results = decode::<TaskAddCollectionResultDto>(&response)?;
            existing.extend(existing_tasks(results)?);
        }
        match existing.into_iter().next() {
            Some(id) => Err(ComputeError::AlreadyExists {
                kind: ResourceKind::Task,
                id,
            }),
            None => Ok(()),
        }
    }

    async fn list_tasks(&self, job_id: &str) -> Result<Vec<Task>, ComputeError> {
        let mut url = self.endpoint(&["jobs", job_id, "tasks"])?;
        let mut tasks = vec![];
        loop {
            let body = self
                .call(Method::GET, url, vec![], ResourceKind::Job, job_id)
                .await?;
            let page = decode::<TaskListDto>(&body)?;
            tasks.extend(page.value.into_iter().map(Task::from));
            match page.next_link {
                Some(link) => {
                    url = Url::parse(&link)
                        .with_context(|| format!("Invalid next page link: {link}"))?;
                }
                None => break,
            }
        }
        Ok(tasks)
    }

    async fn get_task(&self, job_id: &str, task_id: &str) -> Result<Task, ComputeError> {
        let body = self
            .call(
                Method::GET,
                self.endpoint(&["jobs", job_id, "tasks", task_id])?,
                vec![],
                ResourceKind::Task,
                task_id,
            )
            .await?;
        Ok(decode::<TaskDto>(&body)?.into())
    }

    async fn get_task_output(
        &self,
        job_id: &str,
        task_id: &str,
        file_name: &str,
    ) -> Result<Vec<u8>, ComputeError> {
        self.call(
            Method::GET,
            self.endpoint(&["jobs", job_id, "tasks", task_id, "files", file_name])?,
            vec![],
            ResourceKind::NodeFile,
            file_name,
        )
        .await
    }
}

impl BatchRestClient {
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let base = self.credential.account_url();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Batch account url {base} can't carry a path"))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// Sends one signed request, returning the body of a successful response.
    async fn call(
        &self,
        method: Method,
        url: Url,
        body: Vec<u8>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Vec<u8>, ComputeError> {
        let mut headers = HeaderMap::new();
        let now = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        headers.insert("ocp-date", HeaderValue::from_str(&now).map_err(anyhow::Error::from)?);
        headers.insert(
            "client-request-id",
            HeaderValue::from_str(&Uuid::new_v4().to_string()).map_err(anyhow::Error::from)?,
        );
        if !body.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        let authorization = self.credential.authorization(&CanonicalRequest {
            method: &method,
            url: &url,
            headers: &headers,
            content_length: body.len(),
        })?;
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization).map_err(anyhow::Error::from)?,
        );

        debug!(%method, %url, "Calling batch service");
        let mut request = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        let response = request.send().await.map_err(anyhow::Error::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(anyhow::Error::from)?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        Err(error_from_response(kind, id, status.as_u16(), &bytes))
    }
}

/// Ids refused because they already exist. Any other refusal is an error.
fn existing_tasks(results: TaskAddCollectionResultDto) -> Result<Vec<String>, ComputeError> {
    let mut existing = vec![];
    for result in results.value {
        match result.into_error() {
            None => {}
            Some(ComputeError::AlreadyExists { id, .. }) => existing.push(id),
            Some(e) => return Err(e),
        }
    }
    Ok(existing)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> anyhow::Result<T> {
    serde_json::from_slice(body).context("Unexpected response body from batch service")
}

fn error_from_response(kind: ResourceKind, id: &str, status: u16, body: &[u8]) -> ComputeError {
    let error = serde_json::from_slice::<BatchErrorDto>(body).unwrap_or_default();
    let code = error.code.clone().unwrap_or_default();
    match (status, code.as_str()) {
        (409, "PoolExists" | "JobExists" | "TaskExists") => ComputeError::AlreadyExists {
            kind,
            id: id.to_string(),
        },
        (404, _) => ComputeError::NotFound {
            kind,
            id: id.to_string(),
        },
        _ => ComputeError::Rejected {
            status,
            code,
            message: error.message(),
        },
    }
}
