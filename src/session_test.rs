#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::*;
use crate::collab::{CollabBus, Collaborator};
use crate::config::RetryPolicy;
use crate::notice::NoticeLevel;
use crate::synth::{BackendError, GenerationBackend, RenderRequest};

struct EchoBackend {
    delay: Duration,
}

#[async_trait::async_trait]
impl GenerationBackend for EchoBackend {
    async fn render(&self, request: &RenderRequest) -> Result<String, BackendError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("data:,{}", request.operation))
    }
}

fn composition() -> (Composition, LayerId) {
    let mut comp = Composition::new("Acme", "data:image/png;base64,SRC");
    let icon = Layer::new(LayerKind::Icon, 50.0, 40.0);
    let id = icon.id;
    comp.layers.push(icon);
    (comp, id)
}

fn start(comp: Composition, delay: Duration) -> (Session, SessionHandle) {
    let synthesizer = Synthesizer::new(Arc::new(EchoBackend { delay }), RetryPolicy::default());
    Session::new(comp, StudioConfig::default(), synthesizer)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn edit_triggers_debounced_resync() {
    let (comp, icon) = composition();
    let (session, handle) = start(comp, Duration::ZERO);
    tokio::spawn(session.run());

    handle.send(Command::UpdateLayer { id: icon, patch: LayerPatch::position(20.0, 20.0) }).await.unwrap();
    tokio::time::sleep(ms(2900)).await;
    assert!(handle.commit().await.unwrap().light_url.is_none());

    tokio::time::sleep(ms(200)).await;
    let comp = handle.commit().await.unwrap();
    assert_eq!(comp.light_url.as_deref(), Some("data:,recompose:light"));
    assert_eq!(comp.dark_url.as_deref(), Some("data:,recompose:dark"));
    assert_eq!(comp.layers[0].x, 20.0);
}

#[tokio::test(start_paused = true)]
async fn second_sync_while_busy_is_refused() {
    let (comp, _) = composition();
    let (session, handle) = start(comp, ms(1000));
    tokio::spawn(session.run());

    handle.send(Command::SyncNow).await.unwrap();
    handle.send(Command::SyncNow).await.unwrap();
    let notices = handle.take_notices().await.unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].code.as_deref(), Some("E_SYNTHESIS_BUSY"));
    assert!(handle.view().await.unwrap().synthesizing);

    tokio::time::sleep(ms(1100)).await;
    let notices = handle.take_notices().await.unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert!(!handle.view().await.unwrap().synthesizing);
}

#[tokio::test(start_paused = true)]
async fn variants_land_in_the_composition() {
    let (comp, _) = composition();
    let (session, handle) = start(comp, ms(100));
    tokio::spawn(session.run());

    handle.send(Command::GenerateVariants).await.unwrap();
    tokio::time::sleep(ms(250)).await;
    let progress = handle.view().await.unwrap().progress.unwrap();
    assert_eq!(progress.index, 2);

    tokio::time::sleep(ms(1000)).await;
    let view = handle.view().await.unwrap();
    assert!(view.progress.is_none());
    assert_eq!(handle.commit().await.unwrap().variants.len(), 8);
}

#[tokio::test(start_paused = true)]
async fn playback_advances_and_finishes() {
    let (comp, icon) = composition();
    let (session, handle) = start(comp, Duration::ZERO);
    tokio::spawn(session.run());

    handle.send(Command::SetDuration(2.0)).await.unwrap();
    handle
        .send(Command::AddKeyframe { layer_id: icon, property: Property::Opacity, time: 0.0, value: 100.0 })
        .await
        .unwrap();
    handle
        .send(Command::AddKeyframe { layer_id: icon, property: Property::Opacity, time: 2.0, value: 0.0 })
        .await
        .unwrap();
    handle.send(Command::Play).await.unwrap();

    tokio::time::sleep(ms(1000)).await;
    let view = handle.view().await.unwrap();
    assert!(view.playing);
    assert!((view.current_time - 1.0).abs() < 0.05);
    assert!(view.frame[0].opacity > 40.0 && view.frame[0].opacity < 60.0);

    tokio::time::sleep(ms(1500)).await;
    let view = handle.view().await.unwrap();
    assert!(!view.playing);
    assert_eq!(view.current_time, 0.0);
    assert_eq!(view.frame[0].opacity, 100.0);
}

#[tokio::test(start_paused = true)]
async fn scrub_to_nan_keeps_the_session_alive() {
    let (comp, icon) = composition();
    let (session, handle) = start(comp, Duration::ZERO);
    tokio::spawn(session.run());

    for (time, value) in [(0.0, 100.0), (3.0, 0.0)] {
        handle
            .send(Command::AddKeyframe { layer_id: icon, property: Property::Opacity, time, value })
            .await
            .unwrap();
    }
    handle.send(Command::Scrub(f64::NAN)).await.unwrap();

    let view = handle.view().await.unwrap();
    assert_eq!(view.current_time, 0.0);
    assert_eq!(view.frame[0].opacity, 100.0);
}

#[tokio::test(start_paused = true)]
async fn keyframe_for_unknown_layer_becomes_a_notice() {
    let (comp, _) = composition();
    let (session, handle) = start(comp, Duration::ZERO);
    tokio::spawn(session.run());

    handle
        .send(Command::AddKeyframe { layer_id: Uuid::new_v4(), property: Property::X, time: 0.0, value: 1.0 })
        .await
        .unwrap();
    let notices = handle.take_notices().await.unwrap();
    assert_eq!(notices[0].code.as_deref(), Some("E_LAYER_NOT_FOUND"));
}

#[tokio::test(start_paused = true)]
async fn collaborators_see_each_others_edits() {
    let bus = CollabBus::new();
    let (comp, icon) = composition();
    let alice = Collaborator::random();
    let alice_id = alice.id;

    let (a, alice_handle) = start(comp.clone(), Duration::ZERO);
    let (peer, events) = bus.connect(alice);
    tokio::spawn(a.with_collab(peer, events).run());

    let (b, bob_handle) = start(comp, Duration::ZERO);
    let (peer, events) = bus.connect(Collaborator::random());
    tokio::spawn(b.with_collab(peer, events).run());

    alice_handle
        .send(Command::UpdateLayer { id: icon, patch: LayerPatch::position(12.0, 34.0) })
        .await
        .unwrap();
    tokio::time::sleep(ms(10)).await;

    let view = bob_handle.view().await.unwrap();
    assert_eq!((view.frame[0].x, view.frame[0].y), (12.0, 34.0));
    assert_eq!(view.frame[0].locked_by, Some(alice_id));

    tokio::time::sleep(ms(2000)).await;
    let view = bob_handle.view().await.unwrap();
    assert!(view.frame[0].locked_by.is_none());
}

#[tokio::test(start_paused = true)]
async fn shutdown_returns_the_composition_and_closes_the_handle() {
    let (comp, icon) = composition();
    let (session, handle) = start(comp, Duration::ZERO);
    let task = tokio::spawn(session.run());

    handle.send(Command::ToggleVisibility { id: icon }).await.unwrap();
    let comp = handle.shutdown().await.unwrap();
    assert!(!comp.layers[0].visible);
    assert_eq!(task.await.unwrap(), comp);
    assert!(matches!(handle.commit().await, Err(SessionError::Closed)));
}
