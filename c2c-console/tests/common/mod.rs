//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use c2c_console::{Error, Gateway, Param, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Canned reply for one command.
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, &'static str),
    Bytes(&'static [u8]),
}

/// Request seen by the mock.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub command: String,
    pub params: Vec<Param>,
    pub body: Option<Value>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

/// In-process gateway answering from a reply table and recording calls.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, command: &str, reply: Reply) -> Self {
        self.set_reply(command, reply);
        self
    }

    pub fn set_reply(&self, command: &str, reply: Reply) {
        self.replies.lock().insert(command.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn answer(&self, method: &'static str, command: &str, params: &[Param], body: Option<&Value>) -> Result<Reply> {
        self.calls.lock().push(Call {
            method,
            command: command.to_string(),
            params: params.to_vec(),
            body: body.cloned(),
        });

        match self.replies.lock().get(command).cloned() {
            Some(Reply::Status(code, text)) => Err(Error::Status {
                code,
                text: text.to_string(),
                message: None,
            }),
            Some(reply) => Ok(reply),
            None => Err(Error::Status {
                code: 404,
                text: "Not Found".into(),
                message: None,
            }),
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get(&self, command: &str, params: &[Param]) -> Result<Value> {
        match self.answer("GET", command, params, None)? {
            Reply::Json(v) => Ok(v),
            Reply::Bytes(b) => Ok(serde_json::from_slice(b)?),
            Reply::Status(..) => unreachable!(),
        }
    }

    async fn post(&self, command: &str, body: &Value, params: &[Param]) -> Result<Value> {
        match self.answer("POST", command, params, Some(body))? {
            Reply::Json(v) => Ok(v),
            Reply::Bytes(b) => Ok(serde_json::from_slice(b)?),
            Reply::Status(..) => unreachable!(),
        }
    }

    async fn get_bytes(&self, command: &str, params: &[Param]) -> Result<Bytes> {
        match self.answer("GET", command, params, None)? {
            Reply::Json(v) => Ok(Bytes::from(serde_json::to_vec(&v)?)),
            Reply::Bytes(b) => Ok(Bytes::from_static(b)),
            Reply::Status(..) => unreachable!(),
        }
    }
}
