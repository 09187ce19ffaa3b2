use azfn_eventhub::{forwarder, TRIGGER_BINDING};
use azfn_runtime::{handler_fn, server::Server, Config, InvocationResponse, OutputMode};
use hyper::{Body, Client, Request, StatusCode};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use tokio::{sync::oneshot, task::JoinHandle};

struct Host {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<(), azfn_runtime::Error>>,
}

fn start(output_mode: OutputMode) -> Host {
    let config = Config {
        addr: "127.0.0.1:0".parse().expect("addr"),
        output_mode,
    };
    let server = Server::bind(&config, handler_fn(forwarder::handle)).expect("bind");
    let addr = server.local_addr();
    let (shutdown, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server.serve(async {
        let _ = rx.await;
    }));
    Host { addr, shutdown, server }
}

impl Host {
    async fn invoke(&self, messages: Value) -> (StatusCode, InvocationResponse) {
        let mut data = Map::new();
        data.insert(TRIGGER_BINDING.to_owned(), messages);
        let body = json!({
            "Data": data,
            "Metadata": {
                "PartitionContext": { "EventHubName": "telemetry", "PartitionId": "1" },
                "sys": { "MethodName": forwarder::FUNCTION_NAME }
            }
        });
        let req = Request::post(format!("http://{}/{}", self.addr, forwarder::FUNCTION_NAME))
            .header("X-Azure-Functions-InvocationId", "00000000-0000-0000-0000-000000000001")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let res = Client::new().request(req).await.expect("response");
        let status = res.status();
        let bytes = hyper::body::to_bytes(res.into_body()).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("invocation response"))
    }

    async fn stop(self) {
        self.shutdown.send(()).expect("shutdown");
        self.server.await.expect("join").expect("serve");
    }
}

#[tokio::test]
async fn forwards_last_message_to_blob() {
    let host = start(OutputMode::Last);
    let (status, response) = host.invoke(json!(["a", "b", "c"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response.logs,
        vec![
            "LoggingEventHubTriggerJS1 message array: a,b,c",
            "Processed message: a",
            "Processed message: b",
            "Processed message: c",
        ]
    );
    assert_eq!(response.outputs[forwarder::OUTPUT_BINDING], json!("c"));
    assert_eq!(response.return_value, None);
    host.stop().await;
}

#[tokio::test]
async fn fans_out_every_write_when_asked() {
    let host = start(OutputMode::All);
    let (_, response) = host.invoke(json!(["a", { "n": 2 }])).await;
    assert_eq!(response.outputs[forwarder::OUTPUT_BINDING], json!(["a", { "n": 2 }]));
    assert_eq!(response.logs[2], r#"Processed message: {"n":2}"#);
    host.stop().await;
}

#[tokio::test]
async fn empty_batch_leaves_blob_unset() {
    let host = start(OutputMode::Last);
    let (status, response) = host.invoke(json!([])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.logs, vec!["LoggingEventHubTriggerJS1 message array: "]);
    assert!(response.outputs.is_empty());
    host.stop().await;
}

#[tokio::test]
async fn single_cardinality_is_one_message() {
    let host = start(OutputMode::Last);
    let (_, response) = host.invoke(json!("only")).await;
    assert_eq!(response.logs.len(), 2);
    assert_eq!(response.outputs[forwarder::OUTPUT_BINDING], json!("only"));
    host.stop().await;
}

#[tokio::test]
async fn malformed_batch_is_left_to_the_host() {
    let host = start(OutputMode::Last);
    let req = Request::post(format!("http://{}/{}", host.addr, forwarder::FUNCTION_NAME))
        .body(Body::from(r#"{"Data":{}}"#))
        .expect("request");
    let res = Client::new().request(req).await.expect("response");
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    host.stop().await;
}
