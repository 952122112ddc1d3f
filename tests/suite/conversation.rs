//! End-to-end conversation tests against a mock completion API.

use relay_engine::{
    APOLOGY_TEXT, ButtonAction, ButtonPress, ChatId, ChatMessage, Command, InboundEvent, MessageRef,
    PROMPT_TEXT, SYSTEM_PROMPT, STOP_MARKER, SettingChange, Settings, WELCOME_TEXT,
    constrained_reply, unrestricted_reply,
};
use relay_providers::EMPTY_COMPLETION;
use relay_types::MaxTokens;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    LiveController, Outbound, controller, mount_constrained, mount_unrestricted,
    mount_unrestricted_failure,
};

const CHAT: ChatId = ChatId(4242);

async fn start(controller: &mut LiveController) {
    controller
        .handle(InboundEvent::from_message(CHAT, "/start"))
        .await
        .unwrap();
}

async fn ask(controller: &mut LiveController, text: &str) {
    controller
        .handle(InboundEvent::from_message(CHAT, text))
        .await
        .unwrap();
}

fn history(controller: &LiveController) -> Vec<ChatMessage> {
    controller.sessions().get(CHAT).unwrap().history().to_vec()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|request| request.body_json::<Value>().expect("JSON request body"))
        .collect()
}

#[tokio::test]
async fn start_then_question_produces_both_answers() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- one\n- two\n- three").await;
    mount_unrestricted(&server, "A full explanation.").await;
    let mut controller = controller(&server);

    start(&mut controller).await;
    assert_eq!(history(&controller), vec![ChatMessage::system(SYSTEM_PROMPT)]);

    ask(&mut controller, "hello").await;

    assert_eq!(
        controller.transport().take_texts(),
        vec![
            WELCOME_TEXT.to_string(),
            constrained_reply(&Settings::default(), "- one\n- two\n- three"),
            unrestricted_reply("A full explanation."),
        ]
    );
    assert_eq!(
        history(&controller),
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user("hello"),
            ChatMessage::assistant("A full explanation."),
        ]
    );
}

#[tokio::test]
async fn requests_carry_the_expected_parameters() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- short").await;
    mount_unrestricted(&server, "long").await;
    let mut controller = controller(&server);
    start(&mut controller).await;

    ask(&mut controller, "hello").await;

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);

    let constrained = &bodies[0];
    assert_eq!(constrained["model"], "gpt-4o-mini");
    assert_eq!(constrained["max_tokens"], 128);
    assert_eq!(constrained["temperature"], 0.7);
    assert_eq!(constrained["stop"], json!([STOP_MARKER]));
    let messages = constrained["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(
        messages[1]["content"]
            .as_str()
            .unwrap()
            .starts_with("hello\n\nRequirements:")
    );

    let unrestricted = &bodies[1];
    assert_eq!(unrestricted["max_tokens"], 800);
    assert_eq!(unrestricted["temperature"], 0.7);
    assert_eq!(unrestricted["frequency_penalty"], 0.0);
    assert!(unrestricted.get("stop").is_none());
    assert_eq!(
        unrestricted["messages"][1],
        json!({ "role": "user", "content": "hello" })
    );
}

#[tokio::test]
async fn unrestricted_failure_sends_one_apology() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- short").await;
    mount_unrestricted_failure(&server, 503).await;
    let mut controller = controller(&server);
    start(&mut controller).await;
    controller.transport().take();

    ask(&mut controller, "hello").await;

    let outbound = controller.transport().take();
    let texts: Vec<_> = outbound
        .iter()
        .filter_map(|sent| match sent {
            Outbound::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec![APOLOGY_TEXT]);
    assert!(matches!(
        outbound.last(),
        Some(Outbound::Screen { text, .. }) if text == PROMPT_TEXT
    ));
    assert_eq!(history(&controller), vec![ChatMessage::system(SYSTEM_PROMPT)]);
}

#[tokio::test]
async fn settings_button_changes_the_constrained_request() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- short").await;
    mount_unrestricted(&server, "long").await;
    let mut controller = controller(&server);
    start(&mut controller).await;
    controller.transport().take();

    let settings_message = MessageRef::new(CHAT, 2);
    let data = ButtonAction::Set(SettingChange::MaxTokens(MaxTokens::T256)).encode();
    let press = ButtonPress::new(CHAT, "cb", Some(settings_message), Some(data.as_str()));
    controller.handle(InboundEvent::Button(press)).await.unwrap();

    let expected = Settings {
        max_tokens: MaxTokens::T256,
        ..Settings::default()
    };
    assert_eq!(
        controller.sessions().get(CHAT).unwrap().settings(),
        expected
    );
    assert!(matches!(
        controller.transport().take().as_slice(),
        [Outbound::Edit { target, text }]
            if *target == settings_message && text.contains("max_tokens=256")
    ));

    ask(&mut controller, "hello").await;

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["max_tokens"], 256);
    assert_eq!(bodies[1]["max_tokens"], 800);
}

#[tokio::test]
async fn empty_answer_becomes_placeholder() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- short").await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;
    let mut controller = controller(&server);
    start(&mut controller).await;

    ask(&mut controller, "hello").await;

    assert_eq!(
        history(&controller)[2],
        ChatMessage::assistant(EMPTY_COMPLETION)
    );
}

#[tokio::test]
async fn question_before_start_never_calls_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut controller = controller(&server);

    ask(&mut controller, "hello").await;

    assert!(!controller.sessions().contains(CHAT));
    assert!(matches!(
        controller.transport().take().as_slice(),
        [Outbound::Screen { .. }]
    ));
}

#[tokio::test]
async fn reset_command_clears_history() {
    let server = MockServer::start().await;
    mount_constrained(&server, "- short").await;
    mount_unrestricted(&server, "long").await;
    let mut controller = controller(&server);
    start(&mut controller).await;
    ask(&mut controller, "hello").await;
    assert_eq!(history(&controller).len(), 3);

    controller
        .handle(InboundEvent::Command {
            chat: CHAT,
            command: Command::Reset,
        })
        .await
        .unwrap();

    assert_eq!(history(&controller), vec![ChatMessage::system(SYSTEM_PROMPT)]);
}
