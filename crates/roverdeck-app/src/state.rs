//! Application state (Model in TEA pattern)

use std::path::PathBuf;

use roverdeck_core::{AutonomyLevel, Camera, ConnectionState, LED_MODES};

use crate::config::{ControlSettings, EndpointRegistry, Settings};
use crate::dispatcher::CommandDispatcher;
use crate::input::InputAggregator;
use crate::reconciler::{AxisValue, ControlAxis, StateReconciler};

/// Current UI mode/screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// Dashboard with live controls
    #[default]
    Normal,

    /// Endpoint editor dialog; motion keys are not routed while open
    EndpointEditor,
}

/// Which endpoint editor field has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorField {
    #[default]
    Host,
    Port,
}

/// Endpoint editor dialog state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointEditorState {
    pub host: String,
    pub port: String,
    pub focus: EditorField,
    /// Validation error shown inline
    pub error: Option<String>,
}

impl EndpointEditorState {
    pub fn new(host: &str, port: &str) -> Self {
        Self {
            host: host.to_string(),
            port: port.to_string(),
            ..Default::default()
        }
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            EditorField::Host => &mut self.host,
            EditorField::Port => &mut self.port,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            EditorField::Host => EditorField::Port,
            EditorField::Port => EditorField::Host,
        };
    }
}

/// Kind of operator-visible problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    EndpointRejected,
    Channel,
    Config,
}

/// Most recent problem, numbered so observers can tell repeats apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Delivery counters shown in the status bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub motions_sent: u64,
    pub commands_sent: u64,
    pub dropped: u64,
}

/// Complete application state (the Model in TEA)
#[derive(Debug)]
pub struct AppState {
    /// Current UI mode
    pub ui_mode: UiMode,

    /// Persisted endpoint and its derived URLs
    pub registry: EndpointRegistry,

    /// Operator control settings (steps, zoom range)
    pub control: ControlSettings,

    /// Motion input state machine
    pub aggregator: InputAggregator,

    /// Discrete intent mapping
    pub dispatcher: CommandDispatcher,

    /// Platform snapshot plus pending local edits
    pub reconciler: StateReconciler,

    /// Last connectivity reported by the channel session
    pub connection: ConnectionState,

    /// Endpoint editor state while `ui_mode == EndpointEditor`
    pub editor: Option<EndpointEditorState>,

    /// Camera that zoom keys apply to
    pub selected_camera: Camera,

    /// Position in `LED_MODES` for cycling
    pub led_mode_index: usize,

    pub stats: LinkStats,

    /// Last problem worth showing the operator
    pub notice: Option<Notice>,
    notice_seq: u64,

    quitting: bool,
}

impl AppState {
    pub fn new(config_dir: PathBuf) -> Self {
        let settings = crate::config::load_settings(&config_dir);
        Self::with_settings(config_dir, &settings)
    }

    pub fn with_settings(config_dir: PathBuf, settings: &Settings) -> Self {
        Self {
            ui_mode: UiMode::Normal,
            registry: EndpointRegistry::load(config_dir),
            control: settings.control.clone(),
            aggregator: InputAggregator::new(),
            dispatcher: CommandDispatcher::new(&settings.control),
            reconciler: StateReconciler::new(),
            connection: ConnectionState::Disconnected,
            editor: None,
            selected_camera: Camera::Front,
            led_mode_index: 0,
            stats: LinkStats::default(),
            notice: None,
            notice_seq: 0,
            quitting: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    pub fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice_seq += 1;
        self.notice = Some(Notice {
            seq: self.notice_seq,
            kind,
            message: message.into(),
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Displayed servo angle, with a centred default before any status.
    pub fn angle(&self, axis: ControlAxis) -> u16 {
        self.reconciler
            .value(axis)
            .and_then(|v| v.as_angle())
            .unwrap_or(90)
    }

    pub fn speed_limit(&self) -> u16 {
        self.reconciler
            .value(ControlAxis::Speed)
            .and_then(|v| v.as_angle())
            .unwrap_or(100)
    }

    pub fn zoom(&self, camera: Camera) -> f64 {
        self.reconciler
            .value(ControlAxis::Zoom(camera))
            .and_then(|v| v.as_zoom())
            .unwrap_or(self.dispatcher.zoom_range().0)
    }

    pub fn autonomy(&self) -> AutonomyLevel {
        match self.reconciler.value(ControlAxis::Autonomy) {
            Some(AxisValue::Autonomy(level)) => level,
            _ => AutonomyLevel::default(),
        }
    }

    pub fn led_mode(&self) -> &'static str {
        LED_MODES[self.led_mode_index % LED_MODES.len()]
    }
}
