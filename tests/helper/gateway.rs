//! Gateway test utilities

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use stabler::release::error::GatewayError;
use stabler::release::gateway::Gateway;
use stabler::release::types::{InstallRequest, Release};

pub const CORE: &str = "bluerobotics/blueos-core";

/// Scripted gateway simulating the version chooser
///
/// `current_version` pops scripted replies and repeats the last one once the
/// script runs out. Pulling adds the image to the local inventory.
pub struct FakeGateway {
    feed: Mutex<Vec<String>>,
    current: Mutex<VecDeque<Result<String, String>>>,
    local: Mutex<Vec<Release>>,
    pull_materializes: bool,
    pub pulls: AtomicUsize,
    pub switches: AtomicUsize,
    pub current_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            feed: Mutex::new(Vec::new()),
            current: Mutex::new(VecDeque::new()),
            local: Mutex::new(Vec::new()),
            pull_materializes: true,
            pulls: AtomicUsize::new(0),
            switches: AtomicUsize::new(0),
            current_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_feed(self, tags: &[&str]) -> Self {
        self.set_feed(tags);
        self
    }

    pub fn set_feed(&self, tags: &[&str]) {
        *self.feed.lock().unwrap() = tags.iter().map(|t| t.to_string()).collect();
    }

    pub fn with_running(self, tag: &str) -> Self {
        self.current.lock().unwrap().push_back(Ok(tag.to_string()));
        self
    }

    /// Script an unreachable reply for `current_version`
    pub fn with_unreachable(self) -> Self {
        self.current
            .lock()
            .unwrap()
            .push_back(Err("connection refused".to_string()));
        self
    }

    pub fn with_local(self, tags: &[&str]) -> Self {
        self.local
            .lock()
            .unwrap()
            .extend(tags.iter().map(|t| Release::new(CORE, t)));
        self
    }

    /// Pulls are accepted but never produce an image
    pub fn with_broken_pull(mut self) -> Self {
        self.pull_materializes = false;
        self
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn switch_count(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn current_version(&self) -> Result<String, GatewayError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let mut current = self.current.lock().unwrap();
        let reply = if current.len() > 1 {
            current.pop_front()
        } else {
            current.front().cloned()
        };
        match reply {
            Some(Ok(tag)) => Ok(tag),
            Some(Err(msg)) => Err(GatewayError::Unreachable(msg)),
            None => Err(GatewayError::InvalidResponse("no running version".to_string())),
        }
    }

    async fn local_inventory(&self) -> Result<Vec<Release>, GatewayError> {
        Ok(self.local.lock().unwrap().clone())
    }

    async fn remote_inventory(&self) -> Result<Vec<Release>, GatewayError> {
        let feed = self.feed.lock().unwrap();
        Ok(feed.iter().map(|t| Release::new(CORE, t)).collect())
    }

    async fn release_feed(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn pull(&self, request: &InstallRequest) -> Result<(), GatewayError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.pull_materializes {
            self.local
                .lock()
                .unwrap()
                .push(Release::new(&request.repository, &request.tag));
        }
        Ok(())
    }

    async fn switch(&self, _request: &InstallRequest) -> Result<(), GatewayError> {
        self.switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
