//! Application core — event loop, page management, action dispatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use rand::thread_rng;
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use otwatch_api::{PcapService, WorkflowService};
use otwatch_core::model::pcap::{CaptureState, TrainingState};
use otwatch_core::sanitize::{sanitize_filename, sanitize_search_query};
use otwatch_core::{NotificationKind, NotificationStore, SystemStatus, WorkflowTemplate, fixtures};

use crate::action::{Action, ConfirmAction};
use crate::component::Page;
use crate::event::{Event, EventReader};
use crate::page::PageId;
use crate::panels::admin::AdminPanel;
use crate::panels::assistant::AssistantPanel;
use crate::panels::notifications::NotificationsDrawer;
use crate::screens::create_pages;
use crate::theme;
use crate::ticker;
use crate::tui::Tui;

/// Seconds a toast stays on screen.
const TOAST_SECS: u64 = 3;

/// Seconds between automatic monitoring refreshes while that page is open.
const MONITOR_REFRESH_SECS: u64 = 30;

/// Seconds between training status polls.
const TRAINING_POLL_SECS: u64 = 2;

/// Simulated latency of a network discovery scan.
const NETWORK_SCAN_DELAY: Duration = Duration::from_secs(3);

/// Simulated latency of a single-device scan.
const DEVICE_SCAN_DELAY: Duration = Duration::from_millis(1500);

/// Simulated duration of a model training run.
const MODEL_TRAIN_DELAY: Duration = Duration::from_secs(5);

/// Top-level application state and event loop.
pub struct App {
    active_page: PageId,
    pages: HashMap<PageId, Box<dyn Page>>,
    running: bool,
    status: SystemStatus,
    notifications: NotificationStore,
    toast: Option<(NotificationKind, String, Instant)>,
    help_visible: bool,
    sidebar_visible: bool,
    search_active: bool,
    search_query: String,
    drawer_visible: bool,
    drawer: NotificationsDrawer,
    assistant_visible: bool,
    assistant: AssistantPanel,
    admin_visible: bool,
    admin: AdminPanel,
    pending_confirm: Option<ConfirmAction>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    pcap: Arc<PcapService>,
    workflows: Arc<WorkflowService>,
    /// Templates as last loaded; execute requests resolve against this.
    template_cache: Vec<WorkflowTemplate>,
    export_dir: PathBuf,
    ticker_cancel: Option<CancellationToken>,
    monitor_cancel: Option<CancellationToken>,
    training_cancel: Option<CancellationToken>,
    /// In-flight background tasks; drives the header spinner.
    busy: usize,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl App {
    pub fn new(
        pcap: PcapService,
        workflows: WorkflowService,
        admin_password: SecretString,
        export_dir: PathBuf,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let pages = create_pages(&export_dir);
        let admin = AdminPanel::new(admin_password, export_dir.clone());

        Self {
            active_page: PageId::default(),
            pages,
            running: true,
            status: SystemStatus::default(),
            notifications: NotificationStore::new(),
            toast: None,
            help_visible: false,
            sidebar_visible: false,
            search_active: false,
            search_query: String::new(),
            drawer_visible: false,
            drawer: NotificationsDrawer::new(),
            assistant_visible: false,
            assistant: AssistantPanel::new(),
            admin_visible: false,
            admin,
            pending_confirm: None,
            action_tx,
            action_rx,
            pcap: Arc::new(pcap),
            workflows: Arc::new(workflows),
            template_cache: Vec::new(),
            export_dir,
            ticker_cancel: None,
            monitor_cancel: None,
            training_cancel: None,
            busy: 0,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn init_pages(&mut self) -> Result<()> {
        for page in self.pages.values_mut() {
            page.init(self.action_tx.clone())?;
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_pages()?;
        self.ticker_cancel = Some(ticker::spawn(self.action_tx.clone()));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("console event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        for cancel in [
            self.ticker_cancel.take(),
            self.monitor_cancel.take(),
            self.training_cancel.take(),
        ]
        .into_iter()
        .flatten()
        {
            cancel.cancel();
        }
        events.stop();
        info!("console event loop ended");
        Ok(())
    }

    // ── Key handling ─────────────────────────────────────────────────

    /// Map a key event to an action. Overlays take priority over global
    /// keys; global keys take priority over the active page.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Confirmation dialog captures all input.
        if self.pending_confirm.is_some() {
            match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                    if let Some(confirm) = self.pending_confirm.take() {
                        self.apply_confirmed(&confirm)?;
                    }
                }
                KeyCode::Char('n' | 'N') | KeyCode::Esc => self.pending_confirm = None,
                _ => {}
            }
            return Ok(None);
        }

        if self.admin_visible {
            return Ok(self.admin.handle_key_event(key));
        }

        // Both side panels may be open at once; their toggles stay live so
        // the sibling can be opened or closed while one holds key focus.
        if self.drawer_visible || self.assistant_visible {
            if key.modifiers == KeyModifiers::SHIFT {
                if key.code == KeyCode::Char('N') {
                    return Ok(Some(Action::ToggleNotifications));
                }
                if key.code == KeyCode::Char('A') {
                    return Ok(Some(Action::ToggleAssistant));
                }
            }
            if self.drawer_visible {
                return Ok(self.drawer.handle_key_event(key, &mut self.notifications));
            }
            return Ok(self.assistant.handle_key_event(key));
        }

        if self.search_active {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Enter => Some(Action::CloseSearch),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    Some(Action::SearchInput(sanitize_search_query(&self.search_query)))
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    Some(Action::SearchInput(sanitize_search_query(&self.search_query)))
                }
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        // A page form absorbs everything except Ctrl+C.
        let capturing = self
            .pages
            .get(&self.active_page)
            .is_some_and(|p| p.capturing_input());
        if capturing {
            if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
                return Ok(Some(Action::Quit));
            }
            if let Some(page) = self.pages.get_mut(&self.active_page) {
                return page.handle_key_event(key);
            }
            return Ok(None);
        }

        // Global keybindings.
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('/')) => return Ok(Some(Action::OpenSearch)),
            (KeyModifiers::NONE, KeyCode::Char('b')) => return Ok(Some(Action::ToggleSidebar)),

            (KeyModifiers::SHIFT, KeyCode::Char('N')) => {
                return Ok(Some(Action::ToggleNotifications));
            }
            (KeyModifiers::SHIFT, KeyCode::Char('A')) => return Ok(Some(Action::ToggleAssistant)),
            (KeyModifiers::NONE, KeyCode::Char('9')) => return Ok(Some(Action::ToggleAdmin)),

            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='8')) => {
                let n = (c as u8 - b'0') as usize;
                return Ok(Some(Action::SwitchPage(PageId::from_number(n))));
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchPage(self.active_page.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchPage(self.active_page.prev())));
            }

            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

            _ => {}
        }

        if let Some(page) = self.pages.get_mut(&self.active_page) {
            return page.handle_key_event(key);
        }
        Ok(None)
    }

    // ── Action processing ────────────────────────────────────────────

    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Render | Action::Resize(_, _) => {}

            Action::Tick => {
                if let Some((_, _, shown)) = &self.toast
                    && shown.elapsed() > Duration::from_secs(TOAST_SECS)
                {
                    self.toast = None;
                }
                if self.busy > 0 {
                    self.throbber_state.calc_next();
                }
                // Pages animate and expire banners on tick.
                self.forward_to_active(action)?;
            }

            Action::SwitchPage(target) => self.switch_page(*target)?,
            Action::GoBack => self.forward_to_active(action)?,

            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::ToggleSidebar => self.sidebar_visible = !self.sidebar_visible,

            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }
            Action::CloseSearch => self.search_active = false,
            Action::SearchInput(_) => self.forward_to_active(action)?,

            Action::ToggleNotifications => self.drawer_visible = !self.drawer_visible,
            Action::ToggleAssistant => self.assistant_visible = !self.assistant_visible,
            Action::ToggleAdmin => {
                self.admin_visible = !self.admin_visible;
                if !self.admin_visible {
                    self.admin.reset();
                }
            }

            Action::Confirm(confirm) => self.pending_confirm = Some(confirm.clone()),
            Action::TaskDone => self.busy = self.busy.saturating_sub(1),

            Action::Notify { kind, title, message } => {
                self.notifications.push(*kind, title.clone(), message.clone());
                self.toast = Some((*kind, format!("{title}: {message}"), Instant::now()));
            }

            // ── Telemetry ────────────────────────────────────────────
            Action::StatusUpdated(status) => {
                self.status = (**status).clone();
                self.forward_to_all(action)?;
            }
            Action::TickerNotice { kind, title, message } => {
                self.notifications.push_from_ticker(*kind, *title, *message);
                self.toast = Some((*kind, format!("{title}: {message}"), Instant::now()));
            }

            // ── Simulated scans and training ─────────────────────────
            Action::ScanNetworkRequest { next_id } => {
                let next_id = *next_id;
                self.spawn_task(move |tx| async move {
                    tokio::time::sleep(NETWORK_SCAN_DELAY).await;
                    let device = {
                        let mut rng = thread_rng();
                        fixtures::discovered_device(&mut rng, next_id)
                    };
                    let _ = tx.send(Action::ScanNetworkDone(Box::new(device)));
                });
            }
            Action::ScanDeviceRequest { device_id } => {
                let device_id = *device_id;
                self.spawn_task(move |tx| async move {
                    tokio::time::sleep(DEVICE_SCAN_DELAY).await;
                    let result = {
                        let mut rng = thread_rng();
                        fixtures::scan_device(&mut rng)
                    };
                    let _ = tx.send(Action::ScanDeviceDone { device_id, result });
                });
            }
            Action::TrainModelRequest { model_id } => {
                let model_id = *model_id;
                self.spawn_task(move |tx| async move {
                    tokio::time::sleep(MODEL_TRAIN_DELAY).await;
                    let _ = tx.send(Action::TrainModelDone { model_id });
                });
            }

            Action::ScanNetworkDone(_) | Action::ScanDeviceDone { .. } | Action::DeviceRemove(_) => {
                self.forward_to(PageId::Devices, action)?;
            }
            Action::TrainModelDone { .. } => self.forward_to(PageId::AiModels, action)?,
            Action::MonitoringRefresh => self.forward_to(PageId::Monitoring, action)?,

            // ── PCAP backend ─────────────────────────────────────────
            Action::PcapReload => {
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let (files, stats) = tokio::join!(pcap.list(50), pcap.stats());
                    match (files, stats) {
                        (Ok(files), Ok(stats)) => {
                            let _ = tx.send(Action::PcapLoaded { files, stats });
                        }
                        (Err(err), _) | (_, Err(err)) => {
                            warn!(%err, "pcap reload failed");
                            let _ = tx.send(Action::PcapBanner(err.banner_message()));
                        }
                    }
                });
            }
            Action::PcapDelete(id) => {
                let id = *id;
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.delete(id).await {
                        Ok(()) => tx.send(Action::PcapDeleted(id)),
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::PcapUploadRequest { path, auto_train } => {
                let path = path.clone();
                let auto_train = *auto_train;
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let filename = path
                        .file_name()
                        .map(|n| sanitize_filename(&n.to_string_lossy()))
                        .unwrap_or_default();
                    let result = match tokio::fs::read(&path).await {
                        Ok(contents) => pcap.upload(&filename, contents, auto_train).await,
                        Err(err) => {
                            let _ = tx.send(Action::PcapBanner(format!(
                                "Could not read {}: {err}",
                                path.display()
                            )));
                            return;
                        }
                    };
                    let _ = match result {
                        Ok(file) => tx.send(Action::PcapUploaded(Box::new(file))),
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::PcapToggleFlag { id, flagged } => {
                let (id, flagged) = (*id, *flagged);
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.set_flagged(id, flagged).await {
                        Ok(file) => tx.send(Action::PcapFlagUpdated(Box::new(file))),
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::PcapDownload(id) => {
                let id = *id;
                let pcap = self.pcap.clone();
                let dir = self.export_dir.clone();
                self.spawn_task(move |tx| async move {
                    let result = async {
                        let file = pcap.get(id).await?;
                        let bytes = pcap.download(id).await?;
                        Ok::<_, otwatch_api::Error>((file, bytes))
                    }
                    .await;
                    let _ = match result {
                        Ok((file, bytes)) => {
                            let path = dir.join(sanitize_filename(&file.original_filename));
                            match tokio::fs::write(&path, &bytes).await {
                                Ok(()) => tx.send(Action::notify_success(
                                    "Download complete",
                                    format!("Wrote {}", path.display()),
                                )),
                                Err(err) => tx.send(Action::PcapBanner(format!(
                                    "Could not write {}: {err}",
                                    path.display()
                                ))),
                            }
                        }
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::CaptureStart => {
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.capture_start(None).await {
                        Ok(status) => tx.send(Action::CaptureChanged(if status.running {
                            CaptureState::Running
                        } else {
                            CaptureState::Stopped
                        })),
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::CaptureStop => {
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.capture_stop().await {
                        Ok(status) => tx.send(Action::CaptureChanged(if status.running {
                            CaptureState::Running
                        } else {
                            CaptureState::Stopped
                        })),
                        Err(err) => tx.send(Action::PcapBanner(err.banner_message())),
                    };
                });
            }
            Action::TrainingStart(ids) => {
                let ids = ids.clone();
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.training_start(&ids).await {
                        Ok(status) => tx.send(training_update(&status)),
                        Err(err) => {
                            let _ = tx.send(Action::TrainingPollStop);
                            tx.send(Action::PcapBanner(err.banner_message()))
                        }
                    };
                });
                self.start_training_poll();
            }
            Action::TrainingPoll => {
                let pcap = self.pcap.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match pcap.training_status().await {
                        Ok(status) => tx.send(training_update(&status)),
                        Err(err) => {
                            let _ = tx.send(Action::TrainingPollStop);
                            tx.send(Action::PcapBanner(err.banner_message()))
                        }
                    };
                });
            }
            Action::TrainingPollStop => {
                if let Some(cancel) = self.training_cancel.take() {
                    cancel.cancel();
                }
            }

            Action::PcapLoaded { .. }
            | Action::PcapBanner(_)
            | Action::PcapDeleted(_)
            | Action::PcapUploaded(_)
            | Action::PcapFlagUpdated(_)
            | Action::CaptureChanged(_)
            | Action::TrainingStatusUpdated { .. } => self.forward_to(PageId::Pcap, action)?,

            // ── Workflow backend ─────────────────────────────────────
            Action::WorkflowsReload => {
                let workflows = self.workflows.clone();
                self.spawn_task(move |tx| async move {
                    match workflows.list_templates().await {
                        Ok((templates, source)) => {
                            let _ = tx.send(Action::WorkflowTemplatesLoaded { templates, source });
                        }
                        Err(err) => {
                            let _ = tx.send(Action::WorkflowBanner(err.banner_message()));
                        }
                    }
                    match workflows.list_instances().await {
                        Ok((instances, source)) => {
                            let _ = tx.send(Action::WorkflowInstancesLoaded { instances, source });
                        }
                        Err(err) => {
                            let _ = tx.send(Action::WorkflowBanner(err.banner_message()));
                        }
                    }
                });
            }
            Action::WorkflowCreate(body) => {
                let body = body.clone();
                let workflows = self.workflows.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match workflows.create_template(&body).await {
                        Ok((template, _)) => tx.send(Action::WorkflowCreated(Box::new(template))),
                        Err(err) => tx.send(Action::WorkflowBanner(err.banner_message())),
                    };
                });
            }
            Action::WorkflowDelete(id) => {
                let id = id.clone();
                let workflows = self.workflows.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match workflows.delete_template(&id).await {
                        Ok(_) => tx.send(Action::WorkflowDeleted(id)),
                        Err(err) => tx.send(Action::WorkflowBanner(err.banner_message())),
                    };
                });
            }
            Action::WorkflowExecute { template_id, target_device } => {
                let Some(template) = self
                    .template_cache
                    .iter()
                    .find(|t| t.id == *template_id)
                    .cloned()
                else {
                    self.action_tx
                        .send(Action::WorkflowBanner("Template no longer exists".into()))?;
                    return Ok(());
                };
                let target = target_device.clone();
                let workflows = self.workflows.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match workflows.execute_template(&template, &target, "operator").await {
                        Ok((instance, _)) => tx.send(Action::WorkflowStarted(Box::new(instance))),
                        Err(err) => tx.send(Action::WorkflowBanner(err.banner_message())),
                    };
                });
            }
            Action::WorkflowCancel(id) => {
                let id = id.clone();
                let workflows = self.workflows.clone();
                self.spawn_task(move |tx| async move {
                    let _ = match workflows.cancel_instance(&id).await {
                        Ok((instance, _)) => tx.send(Action::WorkflowCancelled(Box::new(instance))),
                        Err(err) => tx.send(Action::WorkflowBanner(err.banner_message())),
                    };
                });
            }

            Action::WorkflowTemplatesLoaded { templates, .. } => {
                self.template_cache = templates.clone();
                self.forward_to(PageId::Workflows, action)?;
            }
            Action::WorkflowInstancesLoaded { .. }
            | Action::WorkflowCreated(_)
            | Action::WorkflowDeleted(_)
            | Action::WorkflowStarted(_)
            | Action::WorkflowCancelled(_)
            | Action::WorkflowBanner(_) => self.forward_to(PageId::Workflows, action)?,

            // ── Admin ────────────────────────────────────────────────
            Action::AdminDeleteUser(id) => self.admin.delete_user(*id),
        }
        Ok(())
    }

    fn switch_page(&mut self, target: PageId) -> Result<()> {
        if target == self.active_page {
            return Ok(());
        }
        debug!("switching page: {} -> {}", self.active_page, target);

        if self.active_page == PageId::Monitoring
            && let Some(cancel) = self.monitor_cancel.take()
        {
            cancel.cancel();
        }
        self.active_page = target;
        if target == PageId::Monitoring {
            self.start_monitor_refresh();
        }
        Ok(())
    }

    /// Periodic refresh while the monitoring page is open.
    fn start_monitor_refresh(&mut self) {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(MONITOR_REFRESH_SECS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await; // immediate first tick
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Action::MonitoringRefresh).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.monitor_cancel = Some(cancel);
    }

    fn start_training_poll(&mut self) {
        if let Some(old) = self.training_cancel.take() {
            old.cancel();
        }
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(TRAINING_POLL_SECS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Action::TrainingPoll).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.training_cancel = Some(cancel);
    }

    /// Spawn a background task and count it for the busy spinner.
    fn spawn_task<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(mpsc::UnboundedSender<Action>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.busy += 1;
        let tx = self.action_tx.clone();
        let fut = task(tx.clone());
        tokio::spawn(async move {
            fut.await;
            let _ = tx.send(Action::TaskDone);
        });
    }

    fn forward_to_active(&mut self, action: &Action) -> Result<()> {
        self.forward_to(self.active_page, action)
    }

    fn forward_to(&mut self, target: PageId, action: &Action) -> Result<()> {
        if let Some(page) = self.pages.get_mut(&target)
            && let Some(follow_up) = page.update(action)?
        {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    fn forward_to_all(&mut self, action: &Action) -> Result<()> {
        for page in self.pages.values_mut() {
            if let Some(follow_up) = page.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Map a confirmed dialog to its follow-up action.
    fn apply_confirmed(&mut self, confirm: &ConfirmAction) -> Result<()> {
        match confirm {
            ConfirmAction::RemoveDevice { id, .. } => {
                self.action_tx.send(Action::DeviceRemove(*id))?;
            }
            ConfirmAction::DeletePcap { id, .. } => {
                self.action_tx.send(Action::PcapDelete(*id))?;
            }
            ConfirmAction::DeleteWorkflowTemplate { id, .. } => {
                self.action_tx.send(Action::WorkflowDelete(id.clone()))?;
            }
            ConfirmAction::CancelWorkflowInstance { id, .. } => {
                self.action_tx.send(Action::WorkflowCancel(id.clone()))?;
            }
            ConfirmAction::DeleteUser { id, .. } => {
                self.action_tx.send(Action::AdminDeleteUser(*id))?;
            }
            ConfirmAction::ClearNotifications => self.notifications.clear(),
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Length(1), // header
            Constraint::Min(1),    // content
            Constraint::Length(1), // tab bar
            Constraint::Length(1), // status bar
        ])
        .split(area);

        self.render_header(frame, layout[0]);

        let content = if self.sidebar_visible {
            let columns =
                Layout::horizontal([Constraint::Length(20), Constraint::Min(1)]).split(layout[1]);
            self.render_sidebar(frame, columns[0]);
            columns[1]
        } else {
            layout[1]
        };

        if let Some(page) = self.pages.get(&self.active_page) {
            page.render(frame, content);
        }

        self.render_tab_bar(frame, layout[2]);
        self.render_status_bar(frame, layout[3]);

        // Overlays, last on top.
        if let Some((kind, text, _)) = &self.toast {
            render_toast(frame, area, *kind, text);
        }
        if self.drawer_visible {
            let mut drawer_area = layout[1];
            if self.assistant_visible {
                // Side by side: the drawer sits left of the assistant column.
                drawer_area.width = drawer_area.width.saturating_sub(AssistantPanel::WIDTH);
            }
            self.drawer.render(frame, drawer_area, &self.notifications);
        }
        if self.assistant_visible {
            self.assistant.render(frame, layout[1]);
        }
        if self.admin_visible {
            self.admin.render(frame, area);
        }
        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
        if let Some(confirm) = &self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let devices = &self.status.devices;
        let threats = &self.status.threats;
        let models = &self.status.models;

        let mut line = Line::default();
        line.push_span(Span::styled(" otwatch ", theme::title_style()));
        line.push_span(Span::styled(
            format!(" dev {}/{} ", devices.online, devices.total),
            if devices.online < devices.total {
                theme::warning()
            } else {
                theme::success()
            },
        ));
        line.push_span(Span::styled(
            format!(" thr {} ", threats.active),
            if threats.active > 0 { theme::error() } else { theme::success() },
        ));
        line.push_span(Span::styled(
            format!(" mdl {} ({} training) ", models.active, models.training),
            theme::dim(),
        ));
        line.push_span(Span::styled(
            format!(" acc {} ", models.accuracy),
            theme::dim(),
        ));
        let unread = self.notifications.unread_count();
        if unread > 0 {
            line.push_span(Span::styled(format!(" {unread} unread "), theme::warning()));
        }
        frame.render_widget(Paragraph::new(line), area);

        if self.busy > 0 {
            let spinner_area = Rect {
                x: area.x + area.width.saturating_sub(14),
                y: area.y,
                width: 14.min(area.width),
                height: 1,
            };
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("working")
                .style(theme::dim())
                .throbber_style(Style::default().fg(theme::CONTROL_TEAL));
            frame.render_stateful_widget(
                throbber,
                spinner_area,
                &mut self.throbber_state.clone(),
            );
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(theme::border_unfocused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = PageId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_page {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {}", id.number(), id.label()), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = PageId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_page {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(PageId::ALL.iter().position(|&p| p == self.active_page).unwrap_or(0));
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::CONTROL_TEAL)),
                Span::styled(&self.search_query, Style::default().fg(theme::STEEL_BLUE)),
                Span::styled("_", Style::default().fg(theme::STEEL_BLUE)),
                Span::styled("  Esc cancel  Enter done", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let page_hints = self
            .pages
            .get(&self.active_page)
            .map(|p| p.key_hints())
            .unwrap_or_default();

        let mut line = Line::default();
        if !page_hints.is_empty() {
            line.push_span(Span::styled(format!(" {page_hints}"), theme::dim()));
            line.push_span(Span::styled("  |", theme::key_hint()));
        }
        line.push_span(Span::styled(
            "  ? help  / search  N alerts  A assist  9 admin  q quit",
            theme::key_hint(),
        ));
        frame.render_widget(Paragraph::new(line), area);
    }

    #[allow(clippy::unused_self)]
    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let width = 64u16.min(area.width.saturating_sub(4));
        let height = 20u16.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(Span::styled(" Keyboard Shortcuts ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let key = |k: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<12}"), theme::key_hint()),
                Span::styled(desc, theme::dim()),
            ])
        };
        let section = |name: &'static str| {
            Line::from(Span::styled(format!("  {name}"), Style::default().fg(theme::CONTROL_TEAL)))
        };

        let text = vec![
            Line::default(),
            section("Navigation"),
            key("1-8", "Jump to page"),
            key("Tab / S-Tab", "Next / previous page"),
            key("j/k or arrows", "Move selection"),
            key("Enter", "Open / select"),
            key("Esc", "Back / close"),
            Line::default(),
            section("Global"),
            key("/", "Search the active page"),
            key("N", "Notifications drawer"),
            key("A", "Assistant"),
            key("9", "Admin panel"),
            key("b", "Toggle sidebar"),
            key("?", "This help"),
            key("q / Ctrl+C", "Quit"),
            Line::default(),
            Line::from(Span::styled("                  Esc or ? to close", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }
}

/// Map a backend training status to the page-level state.
fn training_update(status: &otwatch_api::pcap::TrainingStatus) -> Action {
    let state = match status.status.as_str() {
        "starting" => TrainingState::Starting,
        "completed" => TrainingState::Completed,
        "failed" => TrainingState::Failed,
        _ => TrainingState::Running,
    };
    Action::TrainingStatusUpdated {
        state,
        progress: status.progress,
        message: status.message.clone(),
    }
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let width = 54u16.min(area.width.saturating_sub(4));
    let height = 5u16;
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(area.x + x, area.y + y, width, height);

    frame.render_widget(Clear, dialog_area);
    let block = Block::default()
        .title(Span::styled(" Confirm ", theme::title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::WARN_YELLOW))
        .style(theme::panel_bg());
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(Span::raw(format!("  {confirm}"))),
        Line::default(),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint()),
            Span::styled("confirm    ", theme::dim()),
            Span::styled("n ", theme::key_hint()),
            Span::styled("cancel", theme::dim()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_toast(frame: &mut Frame, area: Rect, kind: NotificationKind, text: &str) {
    #[allow(clippy::cast_possible_truncation)]
    let width = (text.chars().count() as u16 + 6).clamp(20, 60);
    let height = 3u16;
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2); // above the status bar
    let toast_area = Rect::new(area.x + x, area.y + y, width.min(area.width), height);

    let color = theme::notification_color(kind);
    let icon = match kind {
        NotificationKind::Success => "+",
        NotificationKind::Error => "x",
        NotificationKind::Warning => "!",
        NotificationKind::Info => "i",
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(theme::panel_bg());
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::raw(text.to_owned()),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use otwatch_api::{RestClient, TransportConfig};

    fn app() -> App {
        let url: url::Url = "http://127.0.0.1:1".parse().unwrap();
        let transport = TransportConfig::default();
        let client = RestClient::new(url.clone(), &transport).unwrap();
        let client2 = RestClient::new(url, &transport).unwrap();
        App::new(
            PcapService::new(client),
            WorkflowService::new(client2),
            SecretString::from("SecureAdmin2024!"),
            std::env::temp_dir(),
        )
    }

    #[tokio::test]
    async fn quit_keys_stop_the_loop() {
        let mut app = app();
        let action = app
            .handle_key_event(KeyEvent::from(KeyCode::Char('q')))
            .unwrap();
        assert!(matches!(action, Some(Action::Quit)));
        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }

    #[tokio::test]
    async fn number_keys_switch_pages() {
        let mut app = app();
        let action = app
            .handle_key_event(KeyEvent::from(KeyCode::Char('3')))
            .unwrap()
            .unwrap();
        assert!(matches!(action, Action::SwitchPage(PageId::Threats)));
        app.process_action(&action).unwrap();
        assert_eq!(app.active_page, PageId::Threats);
    }

    #[tokio::test]
    async fn confirm_dialog_blocks_global_keys() {
        let mut app = app();
        app.pending_confirm = Some(ConfirmAction::ClearNotifications);
        let action = app
            .handle_key_event(KeyEvent::from(KeyCode::Char('q')))
            .unwrap();
        assert!(action.is_none());
        // Still showing.
        assert!(app.pending_confirm.is_some());
        app.handle_key_event(KeyEvent::from(KeyCode::Char('n'))).unwrap();
        assert!(app.pending_confirm.is_none());
    }

    #[tokio::test]
    async fn confirmed_clear_empties_the_store() {
        let mut app = app();
        app.notifications.push(NotificationKind::Info, "a", "b");
        app.pending_confirm = Some(ConfirmAction::ClearNotifications);
        app.handle_key_event(KeyEvent::from(KeyCode::Char('y'))).unwrap();
        assert!(app.notifications.is_empty());
    }

    #[tokio::test]
    async fn notify_actions_toast_and_persist() {
        let mut app = app();
        app.process_action(&Action::notify_success("Saved", "details"))
            .unwrap();
        assert_eq!(app.notifications.len(), 1);
        assert!(app.toast.is_some());
    }

    #[tokio::test]
    async fn status_updates_replace_the_snapshot() {
        let mut app = app();
        let mut status = SystemStatus::default();
        status.devices.online = 42;
        app.process_action(&Action::StatusUpdated(Box::new(status)))
            .unwrap();
        assert_eq!(app.status.devices.online, 42);
    }

    #[tokio::test]
    async fn search_keys_build_a_sanitized_query() {
        let mut app = app();
        app.process_action(&Action::OpenSearch).unwrap();
        let action = app
            .handle_key_event(KeyEvent::from(KeyCode::Char('p')))
            .unwrap()
            .unwrap();
        assert!(matches!(action, Action::SearchInput(ref q) if q == "p"));
        let action = app.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap();
        assert!(matches!(action, Some(Action::CloseSearch)));
    }

    #[tokio::test]
    async fn drawer_and_assistant_open_together() {
        let mut app = app();
        app.process_action(&Action::ToggleNotifications).unwrap();
        app.process_action(&Action::ToggleAssistant).unwrap();
        assert!(app.drawer_visible);
        assert!(app.assistant_visible);

        // The sibling toggle stays reachable while a panel has key focus.
        let action = app
            .handle_key_event(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT))
            .unwrap();
        assert!(matches!(action, Some(Action::ToggleAssistant)));
        app.process_action(&Action::ToggleAssistant).unwrap();
        assert!(app.drawer_visible);
        assert!(!app.assistant_visible);
    }

    #[tokio::test]
    async fn switching_away_from_monitoring_stops_the_refresh() {
        let mut app = app();
        app.process_action(&Action::SwitchPage(PageId::Monitoring))
            .unwrap();
        assert!(app.monitor_cancel.is_some());
        app.process_action(&Action::SwitchPage(PageId::Dashboard))
            .unwrap();
        assert!(app.monitor_cancel.is_none());
    }

    #[tokio::test]
    async fn task_done_decrements_busy() {
        let mut app = app();
        app.busy = 2;
        app.process_action(&Action::TaskDone).unwrap();
        assert_eq!(app.busy, 1);
        app.process_action(&Action::TaskDone).unwrap();
        app.process_action(&Action::TaskDone).unwrap();
        assert_eq!(app.busy, 0);
    }

    #[tokio::test]
    async fn executing_an_unknown_template_raises_a_banner() {
        let mut app = app();
        app.process_action(&Action::WorkflowExecute {
            template_id: "missing".into(),
            target_device: "PLC-1".into(),
        })
        .unwrap();
        let queued = app.action_rx.try_recv().unwrap();
        assert!(matches!(queued, Action::WorkflowBanner(_)));
    }
}
