//! In-memory registry for tests.
//!
//! `FakeRegistry` implements [`Transport`] over a small model of the
//! registry API: projects, retention policies, the scan-all schedule and
//! per-project immutability rules. Every request is recorded, and a status
//! code can be injected for a method and path prefix.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::clients::{Method, RawResponse, Transport};
use crate::error::Result;

#[derive(Default)]
struct State {
    next_id: i64,
    projects: Vec<Value>,
    retentions: BTreeMap<i64, Value>,
    scan_schedule: Option<Value>,
    immutable_rules: BTreeMap<i64, Vec<Value>>,
    requests: Vec<(Method, String)>,
    failures: Vec<(Method, String, u16)>,
    discard_writes: bool,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn project_mut(&mut self, project_id: i64) -> Option<&mut Value> {
        self.projects
            .iter_mut()
            .find(|p| p["project_id"].as_i64() == Some(project_id))
    }
}

/// Fake registry API backed by JSON values.
#[derive(Default)]
pub struct FakeRegistry {
    state: Mutex<State>,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_project(&self, name: &str) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.projects.push(json!({
            "project_id": id,
            "name": name,
            "metadata": {"public": "false"}
        }));
        id
    }

    /// Store a retention policy for a project and link it through the project metadata.
    pub fn add_retention(&self, project_id: i64, policy: Value) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        let stored = stamp_retention(&mut state, id, policy);
        state.retentions.insert(id, stored);
        if let Some(project) = state.project_mut(project_id) {
            project["metadata"]["retention_id"] = json!(id.to_string());
        }
        id
    }

    pub fn retention(&self, id: i64) -> Option<Value> {
        self.lock().retentions.get(&id).cloned()
    }

    pub fn set_scan_schedule(&self, schedule: Value) {
        self.lock().scan_schedule = Some(schedule);
    }

    pub fn scan_schedule(&self) -> Option<Value> {
        self.lock().scan_schedule.clone()
    }

    pub fn add_immutable_rule(&self, project_id: i64, mut rule: Value) -> i64 {
        let mut state = self.lock();
        let id = state.allocate_id();
        rule["id"] = json!(id);
        state.immutable_rules.entry(project_id).or_default().push(rule);
        id
    }

    pub fn immutable_rules(&self, project_id: i64) -> Vec<Value> {
        self.lock()
            .immutable_rules
            .get(&project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Answer `status` for every `method` request whose path starts with `path_prefix`.
    pub fn fail_on(&self, method: Method, path_prefix: &str, status: u16) {
        self.lock()
            .failures
            .push((method, path_prefix.to_string(), status));
    }

    /// Acknowledge every write with success but leave the stored state untouched.
    pub fn discard_writes(&self) {
        self.lock().discard_writes = true;
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.lock().requests.clone()
    }

    pub fn mutating_requests(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .filter(|(method, _)| method.is_mutating())
            .collect()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests().iter().filter(|(m, _)| *m == method).count()
    }

    /// Serve one request against the in-memory state.
    pub fn handle(&self, method: Method, path: &str, body: Option<&Value>) -> RawResponse {
        let mut state = self.lock();
        state.requests.push((method, path.to_string()));

        let injected = state
            .failures
            .iter()
            .find(|(m, prefix, _)| *m == method && path.starts_with(prefix.as_str()))
            .map(|(_, _, status)| *status);
        if let Some(status) = injected {
            return respond(status, json!({"errors": [{"code": "INJECTED", "message": "injected failure"}]}));
        }
        if state.discard_writes && method.is_mutating() {
            return empty(if method == Method::Post { 201 } else { 200 });
        }

        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = route.trim_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["projects"]) => {
                let param = |key: &str| {
                    query
                        .split('&')
                        .find_map(|pair| pair.strip_prefix(key)?.strip_prefix('='))
                        .map(|raw| urlencoding::decode(raw).map(|v| v.into_owned()).unwrap_or_default())
                };
                let name = param("name").unwrap_or_default();
                let page = param("page").and_then(|p| p.parse::<usize>().ok()).unwrap_or(1).max(1);
                let page_size = param("page_size").and_then(|p| p.parse::<usize>().ok()).unwrap_or(10);
                let matches: Vec<Value> = state
                    .projects
                    .iter()
                    .filter(|p| p["name"].as_str().is_some_and(|n| n.contains(&name)))
                    .skip((page - 1) * page_size)
                    .take(page_size)
                    .cloned()
                    .collect();
                respond(200, Value::Array(matches))
            }
            (Method::Post, ["retentions"]) => {
                let Some(policy) = body.cloned() else {
                    return bad_request();
                };
                let Some(project_id) = policy["scope"]["ref"].as_i64() else {
                    return bad_request();
                };
                let id = state.allocate_id();
                let stored = stamp_retention(&mut state, id, policy);
                state.retentions.insert(id, stored);
                match state.project_mut(project_id) {
                    Some(project) => {
                        project["metadata"]["retention_id"] = json!(id.to_string());
                        empty(201)
                    }
                    None => bad_request(),
                }
            }
            (Method::Get, ["retentions", id]) => match parse_id(id).and_then(|id| state.retentions.get(&id)) {
                Some(policy) => respond(200, policy.clone()),
                None => not_found(),
            },
            (Method::Put, ["retentions", id]) => {
                let (Some(id), Some(policy)) = (parse_id(id), body.cloned()) else {
                    return bad_request();
                };
                if !state.retentions.contains_key(&id) {
                    return not_found();
                }
                let stored = stamp_retention(&mut state, id, policy);
                state.retentions.insert(id, stored);
                empty(200)
            }
            (Method::Get, ["system", "scanAll", "schedule"]) => match &state.scan_schedule {
                Some(schedule) => respond(200, schedule.clone()),
                None => empty(200),
            },
            (Method::Put, ["system", "scanAll", "schedule"]) => {
                let Some(payload) = body else {
                    return bad_request();
                };
                let mut schedule = payload["schedule"].clone();
                schedule["next_scheduled_time"] = json!("2030-01-06T00:00:00Z");
                state.scan_schedule = Some(json!({
                    "creation_time": "2030-01-01T00:00:00Z",
                    "schedule": schedule,
                    "update_time": "2030-01-01T00:00:00Z"
                }));
                empty(200)
            }
            (Method::Get, ["projects", pid, "immutabletagrules"]) => match parse_id(pid) {
                Some(pid) => respond(
                    200,
                    Value::Array(state.immutable_rules.get(&pid).cloned().unwrap_or_default()),
                ),
                None => not_found(),
            },
            (Method::Post, ["projects", pid, "immutabletagrules"]) => {
                let (Some(pid), Some(mut rule)) = (parse_id(pid), body.cloned()) else {
                    return bad_request();
                };
                let id = state.allocate_id();
                rule["id"] = json!(id);
                // The registry assigns its own priority.
                rule["priority"] = json!(id);
                state.immutable_rules.entry(pid).or_default().push(rule);
                empty(201)
            }
            (Method::Delete, ["projects", pid, "immutabletagrules", rid]) => {
                let (Some(pid), Some(rid)) = (parse_id(pid), parse_id(rid)) else {
                    return not_found();
                };
                let rules = state.immutable_rules.entry(pid).or_default();
                let len = rules.len();
                rules.retain(|r| r["id"].as_i64() != Some(rid));
                if rules.len() == len { not_found() } else { empty(200) }
            }
            _ => not_found(),
        }
    }
}

#[async_trait]
impl Transport for FakeRegistry {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<RawResponse> {
        Ok(self.handle(method, path, body))
    }
}

/// Add the server-side ids the registry puts on a stored policy and its rules.
fn stamp_retention(state: &mut State, id: i64, mut policy: Value) -> Value {
    policy["id"] = json!(id);
    if let Some(rules) = policy["rules"].as_array_mut() {
        for rule in rules.iter_mut() {
            state.next_id += 1;
            rule["id"] = json!(state.next_id);
            rule["priority"] = json!(0);
            rule["disabled"] = json!(false);
        }
    }
    policy
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn respond(status: u16, body: Value) -> RawResponse {
    RawResponse {
        status,
        body: body.to_string(),
    }
}

fn empty(status: u16) -> RawResponse {
    RawResponse {
        status,
        body: String::new(),
    }
}

fn not_found() -> RawResponse {
    respond(404, json!({"errors": [{"code": "NOT_FOUND", "message": "not found"}]}))
}

fn bad_request() -> RawResponse {
    respond(400, json!({"errors": [{"code": "BAD_REQUEST", "message": "bad request"}]}))
}
