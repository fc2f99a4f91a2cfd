use std::sync::Arc;
use std::time::Duration;

use postbox_core::{Handler, Inbox, InboxError, MultiplexInbox, PushHandle};
use ulid::Ulid;

#[derive(Debug)]
struct UserRequest {
    message: String,
}

#[derive(Debug)]
struct UserResponse {
    message: String,
    correlation_id: Ulid,
}

impl postbox_core::Message for UserRequest {}
impl postbox_core::Message for UserResponse {}

/// UserRequest を受けて UserResponse を同じ inbox に push する
struct EchoHandler {
    correlation_id: Ulid,
}

#[async_trait::async_trait]
impl Handler<UserRequest> for EchoHandler {
    async fn handle(&self, inbox: &PushHandle, request: Arc<UserRequest>) -> Result<(), InboxError> {
        inbox
            .push(UserResponse {
                message: request.message.clone(),
                correlation_id: self.correlation_id,
            })
            .await;
        Ok(())
    }
}

struct PrintHandler;

#[async_trait::async_trait]
impl Handler<UserResponse> for PrintHandler {
    async fn handle(
        &self,
        _inbox: &PushHandle,
        response: Arc<UserResponse>,
    ) -> Result<(), InboxError> {
        println!(
            "response: {:?} (correlation_id={})",
            response.message, response.correlation_id
        );
        Ok(())
    }
}

/// わざと固まる handler（bounded wait のデモ用）
struct StuckHandler;

#[async_trait::async_trait]
impl Handler<UserRequest> for StuckHandler {
    async fn handle(
        &self,
        _inbox: &PushHandle,
        _request: Arc<UserRequest>,
    ) -> Result<(), InboxError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

struct LogHandler {
    label: &'static str,
}

#[async_trait::async_trait]
impl Handler<UserRequest> for LogHandler {
    async fn handle(
        &self,
        _inbox: &PushHandle,
        request: Arc<UserRequest>,
    ) -> Result<(), InboxError> {
        println!("[{}] saw request: {:?}", self.label, request.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), InboxError> {
    // (A) 排他 inbox で echo: request -> response -> print
    let inbox = Inbox::new();
    let correlation_id = Ulid::new();

    // handler 登録前に push しても、head は待つだけで捨てられない
    inbox
        .push(UserRequest {
            message: "Hello World".to_string(),
        })
        .await;

    inbox.register::<UserRequest, _>(EchoHandler { correlation_id }).await?;
    inbox.register::<UserResponse, _>(PrintHandler).await?;

    // 2 step で request と response を両方処理する
    while inbox.try_process_next().await? {}
    println!("exclusive inbox drained (pending={})", inbox.pending().await);

    // (B) fan-out inbox: 3 handler のうち 1 つが固まっても返ってくる
    let fanout = MultiplexInbox::new(Duration::from_millis(100));
    fanout.register::<UserRequest, _>(LogHandler { label: "audit" }).await;
    fanout.register::<UserRequest, _>(LogHandler { label: "metrics" }).await;
    fanout.register::<UserRequest, _>(StuckHandler).await;

    fanout
        .push(UserRequest {
            message: "fan out please".to_string(),
        })
        .await;

    let issued = fanout.try_process_next().await?;
    println!("fan-out step issued: {issued}");

    // (C) batch report で timeout を観測する
    if let Some(report) = fanout.last_batch().await {
        println!(
            "batch: handlers={} completed={} failed={} unfinished={} timed_out={}",
            report.handlers,
            report.completed,
            report.failed,
            report.unfinished,
            report.timed_out()
        );
    }

    Ok(())
}
