mod common;

use ar_launch_wasm::config::{QuickLookConfig, SceneViewerConfig};
use ar_launch_wasm::error::HostError;
use ar_launch_wasm::host::SessionRequest;
use ar_launch_wasm::providers::native_session::{NativeSessionEvent, NativeSessionProvider};
use ar_launch_wasm::providers::quick_look::{
    QuickLookProvider, ReturnStatus, parse_return_fragment, parse_viewer_url,
};
use ar_launch_wasm::providers::scene_viewer::{SceneViewerProvider, parse_intent_url};
use ar_launch_wasm::types::SessionMode;
use ar_launch_wasm::{
    FeatureName, LaunchError, LaunchMethod, LaunchOptions, LaunchOutcome, LaunchProvider,
    SessionState,
};
use common::*;
use futures::executor::block_on;
use std::cell::RefCell;
use std::rc::Rc;

fn error_sink() -> (Rc<RefCell<Vec<LaunchError>>>, LaunchOptions) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    let options = LaunchOptions::new().on_error(move |e| sink.borrow_mut().push(e.clone()));
    (errors, options)
}

#[test]
fn quick_look_round_trip() {
    let navigation = FakeNavigation::on_page();
    let mut provider = QuickLookProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        navigation.clone(),
        QuickLookConfig::default(),
    );
    assert!(provider.is_supported());

    let options = LaunchOptions::new()
        .with_title("Oak Chair")
        .with_link("https://shop.example.com/products/chair?variant=oak");
    let outcome = block_on(provider.launch(MODEL_USDZ, &options));
    assert_eq!(outcome, LaunchOutcome::launched(LaunchMethod::OsArViewer));

    let clicks = navigation.clicks.borrow();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].rel.as_deref(), Some("ar"));
    assert!(clicks[0].with_image);

    let link = parse_viewer_url(&clicks[0].href).unwrap();
    assert_eq!(link.model_url, MODEL_USDZ);
    assert_eq!(link.title.as_deref(), Some("Oak Chair"));
    assert!(!link.allows_content_scaling);

    // The viewer sends the visitor back through the return link.
    let back = url::Url::parse(link.return_url.as_deref().unwrap()).unwrap();
    assert_eq!(back.query(), Some("variant=oak"));
    assert_eq!(
        parse_return_fragment(back.fragment().unwrap()),
        Some(ReturnStatus::Completed)
    );

    let returned = FakeNavigation {
        hash: Some(format!("#{}", back.fragment().unwrap())),
        ..FakeNavigation::default()
    };
    let provider = QuickLookProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        Rc::new(returned),
        QuickLookConfig::default(),
    );
    assert_eq!(provider.check_return(), Some(ReturnStatus::Completed));
}

#[test]
fn quick_look_falls_back_to_the_current_page_for_the_return_link() {
    let navigation = FakeNavigation::on_page();
    let mut provider = QuickLookProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        navigation.clone(),
        QuickLookConfig {
            allows_content_scaling: true,
        },
    );
    block_on(provider.launch(MODEL_USDZ, &LaunchOptions::new()));

    let link = parse_viewer_url(&navigation.clicks.borrow()[0].href).unwrap();
    assert!(link.allows_content_scaling);
    assert!(link.return_url.unwrap().starts_with(PAGE_URL));
}

#[test]
fn quick_look_rejects_off_ios_and_bad_urls_without_navigating() {
    let navigation = FakeNavigation::on_page();
    let mut provider = QuickLookProvider::new(
        FakeEnv::new(ANDROID_CHROME, XrSupport::Absent),
        navigation.clone(),
        QuickLookConfig::default(),
    );
    assert!(!provider.is_supported());
    assert_eq!(
        block_on(provider.launch(MODEL_USDZ, &LaunchOptions::new())),
        LaunchOutcome::rejected()
    );

    let mut provider = QuickLookProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        navigation.clone(),
        QuickLookConfig::default(),
    );
    for bad in ["not a url", "file:///tmp/chair.usdz", "/models/chair.usdz"] {
        assert!(!block_on(provider.launch(bad, &LaunchOptions::new())).launched);
    }
    assert!(navigation.clicks.borrow().is_empty());
}

#[test]
fn quick_look_needs_ar_anchor_support() {
    let navigation = Rc::new(FakeNavigation {
        url: Some(PAGE_URL.to_string()),
        ar_rel: false,
        ..FakeNavigation::default()
    });
    let provider = QuickLookProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        navigation,
        QuickLookConfig::default(),
    );
    assert!(!provider.is_supported());
}

#[test]
fn scene_viewer_launches_through_an_intent_anchor() {
    let navigation = FakeNavigation::on_page();
    let mut provider = SceneViewerProvider::new(
        FakeEnv::new(ANDROID_CHROME, XrSupport::Absent),
        navigation.clone(),
        SceneViewerConfig::default(),
    );
    let options = LaunchOptions::new()
        .with_title("Oak Chair")
        .with_fallback_url(PAGE_URL);

    let outcome = block_on(provider.launch(MODEL_GLB, &options));
    assert_eq!(outcome, LaunchOutcome::launched(LaunchMethod::IntentLauncher));

    let clicks = navigation.clicks.borrow();
    assert_eq!(clicks[0].rel, None);
    let intent = parse_intent_url(&clicks[0].href).unwrap();
    assert_eq!(intent.file, MODEL_GLB);
    assert_eq!(intent.mode.as_deref(), Some("ar_preferred"));
    assert_eq!(intent.title.as_deref(), Some("Oak Chair"));
    assert_eq!(
        intent.package.as_deref(),
        Some("com.google.android.googlequicksearchbox")
    );
    assert_eq!(intent.fallback_url.as_deref(), Some(PAGE_URL));

    let query = url::Url::parse(&clicks[0].href.replacen("intent://", "https://", 1)).unwrap();
    assert!(query.query_pairs().any(|(key, value)| key == "fallback_url" && value == PAGE_URL));
    assert!(clicks[0].href.contains("S.browser_fallback_url="));
}

#[test]
fn scene_viewer_rejects_a_bad_product_link() {
    let navigation = FakeNavigation::on_page();
    let mut provider = SceneViewerProvider::new(
        FakeEnv::new(ANDROID_CHROME, XrSupport::Absent),
        navigation.clone(),
        SceneViewerConfig::default(),
    );

    for link in ["javascript:alert(1)", "/products/chair"] {
        let options = LaunchOptions::new().with_link(link);
        assert_eq!(
            block_on(provider.launch(MODEL_GLB, &options)),
            LaunchOutcome::rejected()
        );
    }
    assert!(navigation.clicks.borrow().is_empty());
}

#[test]
fn scene_viewer_rejects_off_android() {
    let navigation = FakeNavigation::on_page();
    let mut provider = SceneViewerProvider::new(
        FakeEnv::new(IPHONE_SAFARI, XrSupport::Absent),
        navigation.clone(),
        SceneViewerConfig::default(),
    );
    let (errors, options) = error_sink();

    assert_eq!(
        block_on(provider.launch(MODEL_GLB, &options)),
        LaunchOutcome::rejected()
    );
    assert!(navigation.clicks.borrow().is_empty());
    assert!(errors.borrow().is_empty());
}

#[test]
fn scene_viewer_reports_blocked_navigation() {
    let navigation = Rc::new(FakeNavigation {
        fail_clicks: true,
        ..FakeNavigation::default()
    });
    let mut provider = SceneViewerProvider::new(
        FakeEnv::new(ANDROID_CHROME, XrSupport::Absent),
        navigation,
        SceneViewerConfig::default(),
    );
    let (errors, options) = error_sink();

    assert!(!block_on(provider.launch(MODEL_GLB, &options)).launched);
    assert!(matches!(
        errors.borrow().as_slice(),
        [LaunchError::Navigation(HostError::NotAllowed(_))]
    ));
}

fn native_provider(host: Rc<FakeXrHost>, clock: Rc<ManualClock>) -> NativeSessionProvider {
    let session = Rc::new(RefCell::new(ar_launch_wasm::ArSession::with_clock(clock)));
    NativeSessionProvider::with_session(
        FakeEnv::new(ANDROID_CHROME, XrSupport::Answers(true)),
        host,
        session,
    )
}

#[test]
fn native_session_runs_and_reports_metrics() {
    let host = FakeXrHost::granting(&[FeatureName::HitTest, FeatureName::Anchors]);
    let clock = ManualClock::new();
    let mut provider = native_provider(host.clone(), clock.clone());
    let (events, sink) = recorder::<NativeSessionEvent>();
    provider.on("*", sink);

    let options = LaunchOptions::new()
        .with_required_features([FeatureName::HitTest])
        .with_optional_features([FeatureName::Anchors, FeatureName::LightEstimation])
        .with_dom_overlay("ar-overlay");
    let outcome = block_on(provider.launch(MODEL_GLB, &options));

    assert_eq!(outcome, LaunchOutcome::launched(LaunchMethod::NativeSession));
    assert!(provider.has_live_session());
    assert_eq!(provider.model_url().map(|u| u.as_str()), Some(MODEL_GLB));
    assert_eq!(
        *host.requests.borrow(),
        vec![SessionRequest {
            mode: SessionMode::ImmersiveAr,
            required_features: vec![FeatureName::HitTest],
            optional_features: vec![FeatureName::Anchors, FeatureName::LightEstimation],
            dom_overlay_root: Some("ar-overlay".to_string()),
        }]
    );

    let session = provider.session();
    assert_eq!(session.borrow().state(), SessionState::Active);
    assert_eq!(session.borrow().features_used().len(), 2);

    clock.advance_ms(4_000);
    host.control.platform_end();

    assert!(!provider.has_live_session());
    assert_eq!(session.borrow().state(), SessionState::Ended);
    let events = events.borrow();
    assert!(matches!(
        &events[0],
        NativeSessionEvent::SessionStarted { features, .. } if features.len() == 2
    ));
    match &events[1] {
        NativeSessionEvent::SessionEnded(metrics) => assert_eq!(metrics.duration_ms, 4_000),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(events.len(), 2);
}

#[test]
fn visibility_changes_pause_and_resume() {
    let host = FakeXrHost::granting(&[]);
    let provider = {
        let mut provider = native_provider(host.clone(), ManualClock::new());
        block_on(provider.launch(MODEL_GLB, &LaunchOptions::new()));
        provider
    };
    let session = provider.session();

    host.control.set_visible(false);
    assert_eq!(session.borrow().state(), SessionState::Paused);
    host.control.set_visible(false);
    assert_eq!(session.borrow().state(), SessionState::Paused);
    host.control.set_visible(true);
    assert_eq!(session.borrow().state(), SessionState::Active);

    provider.on_visibility(false);
    assert_eq!(session.borrow().state(), SessionState::Paused);
}

#[test]
fn ending_from_the_page_emits_a_single_end() {
    let host = FakeXrHost::granting(&[FeatureName::HitTest]);
    let mut provider = native_provider(host.clone(), ManualClock::new());
    let (events, sink) = recorder::<NativeSessionEvent>();
    provider.on("sessionEnded", sink);

    block_on(provider.launch(MODEL_GLB, &LaunchOptions::new()));
    provider.end_session();
    provider.end_session();
    host.control.platform_end();

    assert_eq!(host.control.ended_by_page.get(), 1);
    assert_eq!(events.borrow().len(), 1);
    assert_eq!(provider.session().borrow().state(), SessionState::Ended);
}

#[test]
fn refused_session_reports_the_error_and_ends_the_lifecycle() {
    let host = FakeXrHost::failing(HostError::NotSupported("immersive-ar".to_string()));
    let mut provider = native_provider(host, ManualClock::new());
    let (events, sink) = recorder::<NativeSessionEvent>();
    provider.on("error", sink);
    let (errors, options) = error_sink();

    let outcome = block_on(provider.launch(MODEL_GLB, &options));

    assert_eq!(outcome, LaunchOutcome::rejected());
    assert!(!provider.has_live_session());
    assert_eq!(provider.session().borrow().state(), SessionState::Ended);
    assert!(matches!(
        errors.borrow().as_slice(),
        [LaunchError::SessionStart(HostError::NotSupported(_))]
    ));
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn relaunch_replaces_the_running_session() {
    let host = FakeXrHost::granting(&[]);
    let mut provider = native_provider(host.clone(), ManualClock::new());

    block_on(provider.launch(MODEL_GLB, &LaunchOptions::new()));
    block_on(provider.launch(MODEL_GLB, &LaunchOptions::new()));

    assert_eq!(host.control.ended_by_page.get(), 1);
    assert_eq!(host.requests.borrow().len(), 2);
    assert_eq!(provider.session().borrow().state(), SessionState::Active);
}

#[test]
fn native_session_needs_the_api() {
    let mut provider = NativeSessionProvider::new(
        FakeEnv::new(DESKTOP_FIREFOX, XrSupport::Absent),
        FakeXrHost::granting(&[]),
    );
    assert!(!provider.is_supported());
    assert!(!block_on(provider.launch(MODEL_GLB, &LaunchOptions::new())).launched);
}

#[test]
fn dropping_the_provider_ends_the_session() {
    let host = FakeXrHost::granting(&[]);
    let mut provider = native_provider(host.clone(), ManualClock::new());
    block_on(provider.launch(MODEL_GLB, &LaunchOptions::new()));
    let session = provider.session();

    drop(provider);

    assert_eq!(host.control.ended_by_page.get(), 1);
    assert_eq!(session.borrow().state(), SessionState::Ended);
}

#[test]
fn outcome_json_uses_none_for_rejections() {
    assert_eq!(
        serde_json::to_value(LaunchOutcome::rejected()).unwrap(),
        serde_json::json!({ "launched": false, "method": "none" })
    );
}
