//! Транспорт со сценарием ответов для unit-тестов.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

use crate::error::AdminClientResult;
use crate::transport::ApiTransport;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) token: String,
    pub(crate) body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    list_responses: Mutex<VecDeque<(AdminClientResult<Value>, Duration)>>,
    send_responses: Mutex<VecDeque<AdminClientResult<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond_list(&self, response: AdminClientResult<Value>, delay: Duration) {
        self.list_responses
            .lock()
            .expect("lock")
            .push_back((response, delay));
    }

    pub(crate) fn respond_send(&self, response: AdminClientResult<Value>) {
        self.send_responses.lock().expect("lock").push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl ApiTransport for ScriptedApi {
    async fn get_json(
        &self,
        token: &str,
        path: &str,
        params: &[(String, String)],
    ) -> AdminClientResult<Value> {
        self.record(RecordedCall {
            method: Method::GET,
            path: path.to_string(),
            params: params.to_vec(),
            token: token.to_string(),
            body: None,
        });
        let next = self.list_responses.lock().expect("lock").pop_front();
        let (response, delay) = next.unwrap_or_else(|| (Ok(json!({"data": []})), Duration::ZERO));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn send_json(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AdminClientResult<Value> {
        self.record(RecordedCall {
            method,
            path: path.to_string(),
            params: Vec::new(),
            token: token.to_string(),
            body: body.cloned(),
        });
        self.send_responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"success": true})))
    }
}
