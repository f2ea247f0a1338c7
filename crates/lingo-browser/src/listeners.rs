//! Document event wiring.
//!
//! [`Enhancer`] owns the shared [`EnhancerContext`] and the listeners that
//! feed it. Handlers borrow the context only long enough to compute effects;
//! edits then run on `spawn_local` with owned snapshots, so a synthetic event
//! fired mid-edit can re-enter the handlers safely. The context is marked as
//! applying for the whole edit, so those events are not tracked as typing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use lingo_core::{
    AuthGate, Cascade, Edit, Effect, EngineConfig, EnhancerContext, KeyCombo, KeydownResult,
    Modifiers, MutationError, SettingsStore, TextSurface, perform_edit,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, KeyboardEvent};

use crate::overlay::{Overlay, OverlayEvent};
use crate::runtime::RevocationListener;
use crate::strategies::cascade;
use crate::surface::DomSurface;

struct Inner {
    ctx: EnhancerContext<DomSurface>,
    overlay: Option<Overlay>,
    strategies: Rc<Cascade<DomSurface>>,
}

type Shared = Rc<RefCell<Inner>>;

struct Attached<St: SettingsStore> {
    _listeners: Vec<EventListener>,
    _subscription: St::Subscription,
    _revocation: Option<RevocationListener>,
}

/// A running enhancer bound to the current document.
pub struct Enhancer<St: SettingsStore> {
    inner: Shared,
    attached: Rc<RefCell<Option<Attached<St>>>>,
}

/// Start only when `auth` reports a signed-in user.
pub async fn start_if_authenticated<St>(
    auth: &dyn AuthGate,
    store: St,
    config: EngineConfig,
) -> Result<Option<Enhancer<St>>, JsValue>
where
    St: SettingsStore + Clone + 'static,
{
    if !auth.is_authenticated() {
        tracing::info!(target: "lingo::auth", "not authenticated, enhancer stays inactive");
        return Ok(None);
    }
    tracing::info!(target: "lingo::auth", email = ?auth.user_email(), "authenticated");
    Enhancer::start(store, config).await.map(Some)
}

impl<St> Enhancer<St>
where
    St: SettingsStore + Clone + 'static,
{
    /// Load settings, mount the overlay and attach document listeners.
    pub async fn start(store: St, config: EngineConfig) -> Result<Self, JsValue> {
        let settings = store.load().await;
        let strategies = Rc::new(cascade(&config));
        let inner: Shared = Rc::new(RefCell::new(Inner {
            ctx: EnhancerContext::new(settings, config),
            overlay: None,
            strategies,
        }));

        let weak = Rc::downgrade(&inner);
        let overlay = Overlay::mount(Rc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                on_overlay_event(&inner, event);
            }
        }))?;
        inner.borrow_mut().overlay = Some(overlay);
        run_effects(&inner, vec![Effect::RenderPicker]);

        let listeners = attach_listeners(&inner);

        let weak = Rc::downgrade(&inner);
        let reload_store = store.clone();
        let subscription = store.subscribe(Rc::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            let store = reload_store.clone();
            spawn_local(async move {
                let settings = store.load().await;
                let effects = inner.borrow_mut().ctx.reinit(settings);
                run_effects(&inner, effects);
            });
        }));

        let attached = Rc::new(RefCell::new(None));
        let revocation = {
            let weak_inner = Rc::downgrade(&inner);
            let weak_attached = Rc::downgrade(&attached);
            RevocationListener::new(move || {
                let weak_inner = weak_inner.clone();
                let weak_attached = weak_attached.clone();
                // Tear down after the message callback has returned.
                spawn_local(async move {
                    if let (Some(inner), Some(attached)) = (weak_inner.upgrade(), weak_attached.upgrade()) {
                        detach::<St>(&inner, &attached);
                    }
                });
            })
        };
        let revocation = match revocation {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::debug!(target: "lingo::auth", error = ?e, "runtime messages unavailable");
                None
            }
        };

        *attached.borrow_mut() = Some(Attached {
            _listeners: listeners,
            _subscription: subscription,
            _revocation: revocation,
        });
        tracing::info!(target: "lingo::context", "enhancer started");
        Ok(Self { inner, attached })
    }

    /// Detach every listener and remove the overlay.
    pub fn stop(&self) {
        detach::<St>(&self.inner, &self.attached);
    }

    pub fn is_running(&self) -> bool {
        self.attached.borrow().is_some()
    }
}

fn detach<St: SettingsStore>(inner: &Shared, attached: &RefCell<Option<Attached<St>>>) {
    let Some(attached) = attached.borrow_mut().take() else {
        return;
    };
    drop(attached);
    let overlay = {
        let mut inner = inner.borrow_mut();
        inner.ctx.on_blur();
        inner.overlay.take()
    };
    drop(overlay);
    tracing::info!(target: "lingo::context", "enhancer stopped");
}

fn attach_listeners(inner: &Shared) -> Vec<EventListener> {
    let document = gloo_utils::document();
    let mut listeners = Vec::new();

    let weak = Rc::downgrade(inner);
    listeners.push(EventListener::new(&document, "focusin", move |event| {
        with_inner(&weak, |inner| {
            let surface = event.target().and_then(|t| DomSurface::bind(&t));
            let effects = inner.borrow_mut().ctx.on_focus(surface);
            run_effects(inner, effects);
        });
    }));

    let weak = Rc::downgrade(inner);
    listeners.push(EventListener::new(&document, "focusout", move |_| {
        with_inner(&weak, |inner| {
            let effects = inner.borrow_mut().ctx.on_blur();
            run_effects(inner, effects);
        });
    }));

    let weak = Rc::downgrade(inner);
    listeners.push(EventListener::new(&document, "input", move |event| {
        with_inner(&weak, |inner| on_input(inner, event));
    }));

    // Clicks and selection moves can leave the query without a keydown.
    // Capture phase also sees `selectionchange` fired at inputs.
    for kind in ["selectionchange", "mouseup"] {
        let weak = Rc::downgrade(inner);
        listeners.push(EventListener::new_with_options(
            &document,
            kind,
            EventListenerOptions::run_in_capture_phase(),
            move |_| {
                with_inner(&weak, |inner| {
                    let effects = inner.borrow_mut().ctx.on_selection_change();
                    run_effects(inner, effects);
                });
            },
        ));
    }

    // Capture phase, so navigation keys are consumed before the page editor.
    let weak = Rc::downgrade(inner);
    let options = EventListenerOptions {
        phase: EventListenerPhase::Capture,
        passive: false,
    };
    listeners.push(EventListener::new_with_options(
        &document,
        "keydown",
        options,
        move |event| {
            with_inner(&weak, |inner| on_keydown(inner, event));
        },
    ));

    listeners
}

fn with_inner(weak: &Weak<RefCell<Inner>>, f: impl FnOnce(&Shared)) {
    if let Some(inner) = weak.upgrade() {
        f(&inner);
    }
}

fn on_input(inner: &Shared, event: &Event) {
    let effects = {
        let mut guard = inner.borrow_mut();
        let target = event.target().and_then(|t| DomSurface::bind(&t));
        let mut effects = Vec::new();
        if let Some(target) = target {
            let rebind = guard
                .ctx
                .surface()
                .is_none_or(|current| current.element() != target.element());
            if rebind {
                effects.extend(guard.ctx.on_focus(Some(target)));
            }
        }
        effects.extend(guard.ctx.on_input());
        effects
    };
    run_effects(inner, effects);
}

fn on_keydown(inner: &Shared, event: &Event) {
    let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() else {
        return;
    };
    if keyboard.is_composing() {
        return;
    }
    let modifiers = Modifiers {
        ctrl: keyboard.ctrl_key(),
        alt: keyboard.alt_key(),
        shift: keyboard.shift_key(),
        meta: keyboard.meta_key(),
    };
    let combo = KeyCombo::from_event(&keyboard.key(), &keyboard.code(), modifiers);

    let (result, effects) = inner.borrow_mut().ctx.on_keydown(&combo);
    if result == KeydownResult::Handled {
        event.prevent_default();
        event.stop_propagation();
    }
    run_effects(inner, effects);
}

fn on_overlay_event(inner: &Shared, event: OverlayEvent) {
    let effects = {
        let mut guard = inner.borrow_mut();
        match event {
            OverlayEvent::SuggestionClicked(index) => guard.ctx.confirm_suggestion(index),
            OverlayEvent::PickerItemClicked(index) => {
                guard.ctx.insert_picker_item(index).into_iter().collect()
            }
            OverlayEvent::PickerClosed => {
                guard.ctx.picker_mut().hide();
                vec![Effect::HidePicker]
            }
        }
    };
    run_effects(inner, effects);
}

/// Perform handler effects. Must be called with no outstanding borrow.
fn run_effects(inner: &Shared, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Edit(edit) => spawn_edit(inner, edit),
            Effect::ShowDropdown => show_dropdown(inner),
            Effect::HideDropdown => {
                if let Some(overlay) = &inner.borrow().overlay {
                    overlay.hide_dropdown();
                }
            }
            Effect::ShowPicker | Effect::HidePicker => {
                let guard = inner.borrow();
                if let Some(overlay) = &guard.overlay {
                    overlay.set_picker_visible(guard.ctx.picker().is_visible());
                }
            }
            Effect::RenderPicker => {
                let guard = inner.borrow();
                if let Some(overlay) = &guard.overlay {
                    if let Err(e) = overlay.render_picker(&guard.ctx.settings().word_picker_items) {
                        tracing::warn!(target: "lingo::overlay", error = ?e, "could not render picker");
                    }
                }
            }
        }
    }
}

fn show_dropdown(inner: &Shared) {
    let guard = inner.borrow();
    let (Some(overlay), Some(session), Some(surface)) = (
        guard.overlay.as_ref(),
        guard.ctx.autocomplete().session(),
        guard.ctx.surface(),
    ) else {
        return;
    };
    let Some(rect) = surface.caret_rect() else {
        overlay.hide_dropdown();
        return;
    };
    if let Err(e) = overlay.show_dropdown(session, rect, surface.kind(), guard.ctx.config()) {
        tracing::warn!(target: "lingo::overlay", error = ?e, "could not render suggestions");
    }
}

fn spawn_edit(inner: &Shared, edit: Edit) {
    let (surface, settings, config, strategies) = {
        let mut guard = inner.borrow_mut();
        let surface = match guard.ctx.active_surface() {
            Ok(surface) => surface,
            Err(e) => {
                tracing::debug!(target: "lingo::mutation", error = %e, "edit dropped");
                return;
            }
        };
        guard.ctx.begin_edit();
        (
            surface,
            guard.ctx.settings(),
            guard.ctx.config().clone(),
            guard.strategies.clone(),
        )
    };

    let inner = inner.clone();
    spawn_local(async move {
        let result = perform_edit(&surface, &edit, &settings, &config, &strategies).await;
        inner.borrow_mut().ctx.end_edit();
        match result {
            Ok(()) => {}
            Err(MutationError::Exhausted) => {}
            Err(e) => tracing::debug!(target: "lingo::mutation", error = %e, "edit not applied"),
        }
    });
}
