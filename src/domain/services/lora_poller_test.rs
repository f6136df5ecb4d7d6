use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::LoraPoller;
use crate::domain::models::ClientError;
use crate::domain::models::LoraStatus;
use crate::domain::models::LoraStatusResponse;
use crate::domain::models::LoraStatusSource;

struct ScriptedStatus {
    script: Mutex<Vec<Result<LoraStatus, ClientError>>>,
    polls: AtomicUsize,
}

impl ScriptedStatus {
    fn new(script: Vec<Result<LoraStatus, ClientError>>) -> Arc<ScriptedStatus> {
        return Arc::new(ScriptedStatus {
            script: Mutex::new(script.into_iter().rev().collect()),
            polls: AtomicUsize::new(0),
        });
    }

    fn polls(&self) -> usize {
        return self.polls.load(Ordering::SeqCst);
    }
}

#[async_trait]
impl LoraStatusSource for ScriptedStatus {
    async fn lora_status(&self, _persona_id: &str) -> Result<LoraStatusResponse, ClientError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Ok(LoraStatus::Training))?;

        return Ok(LoraStatusResponse {
            lora_status: status,
            lora_model_id: None,
            lora_trigger_word: None,
            training_id: None,
            logs: None,
        });
    }
}

async fn collect(mut rx: mpsc::UnboundedReceiver<LoraStatusResponse>) -> Vec<LoraStatus> {
    let mut statuses = vec![];
    while let Ok(Some(res)) = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
        statuses.push(res.lora_status);
    }

    return statuses;
}

#[tokio::test]
async fn it_polls_until_ready() {
    let source = ScriptedStatus::new(vec![
        Ok(LoraStatus::Pending),
        Ok(LoraStatus::Training),
        Ok(LoraStatus::Ready),
        Ok(LoraStatus::Training),
    ]);
    let mut poller = LoraPoller::new(Duration::from_millis(5));

    let statuses = collect(poller.watch(source.clone(), "p1")).await;

    assert_eq!(
        statuses,
        vec![LoraStatus::Pending, LoraStatus::Training, LoraStatus::Ready]
    );
    assert_eq!(source.polls(), 3);
    assert!(!poller.is_polling());
}

#[tokio::test]
async fn it_stops_on_failed() {
    let source = ScriptedStatus::new(vec![Ok(LoraStatus::Failed)]);
    let mut poller = LoraPoller::new(Duration::from_millis(5));

    let statuses = collect(poller.watch(source.clone(), "p1")).await;

    assert_eq!(statuses, vec![LoraStatus::Failed]);
}

#[tokio::test]
async fn it_skips_polling_errors() {
    let source = ScriptedStatus::new(vec![
        Err(ClientError::Request("offline".to_string())),
        Ok(LoraStatus::Training),
        Err(ClientError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        }),
        Ok(LoraStatus::Ready),
    ]);
    let mut poller = LoraPoller::new(Duration::from_millis(5));

    let statuses = collect(poller.watch(source.clone(), "p1")).await;

    assert_eq!(statuses, vec![LoraStatus::Training, LoraStatus::Ready]);
    assert_eq!(source.polls(), 4);
}

#[tokio::test]
async fn it_cancels_the_previous_poll() {
    let first = ScriptedStatus::new(vec![]);
    let second = ScriptedStatus::new(vec![Ok(LoraStatus::Ready)]);
    let mut poller = LoraPoller::new(Duration::from_millis(20));

    let first_rx = poller.watch(first.clone(), "p1");
    let second_rx = poller.watch(second.clone(), "p1");

    assert_eq!(collect(first_rx).await, Vec::<LoraStatus>::new());
    assert_eq!(collect(second_rx).await, vec![LoraStatus::Ready]);
    assert_eq!(first.polls(), 0);
}

#[tokio::test]
async fn it_stops_when_cancelled() {
    let source = ScriptedStatus::new(vec![]);
    let mut poller = LoraPoller::new(Duration::from_millis(5));
    let mut rx = poller.watch(source.clone(), "p1");

    assert!(rx.recv().await.is_some());
    poller.cancel();

    assert!(!poller.is_polling());
    let rest = collect(rx).await;
    assert!(rest.len() <= 1);
}
