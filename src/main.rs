#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;
use eframe::{egui, App, NativeOptions};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phrasedrill_rust_gui::config::{self, Config};
use phrasedrill_rust_gui::course::library::CourseLibrary;
use phrasedrill_rust_gui::course_io::{
    load_course_file, load_skeleton_file, save_course, scan_course_dir, scan_skeleton_dir,
};
use phrasedrill_rust_gui::profile::{ProfileManager, SharedProfiles};
use phrasedrill_rust_gui::profile_io::{load_or_create_profile, save_profile_snapshot};
use phrasedrill_rust_gui::session::{EditorSession, SessionEvent, SessionState, TrainingSession};

#[derive(Parser, Debug)]
#[command(name = "phrasedrill")]
#[command(about = "Pronunciation drills over recorded course phrases")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Course file to open on start
    #[arg(long)]
    course: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Training,
    Editing,
}

/// Snapshot of what the training panel shows, taken before any button can mutate the session
struct PhraseView {
    unit_title: String,
    text: String,
    i18n_text: String,
    sound: String,
    phonemes: String,
}

struct PhraseDrillApp {
    config: Option<Config>,
    config_error: Option<String>,
    course_files: Vec<PathBuf>,
    selected_course_file: Option<PathBuf>,
    scan_error: Option<String>,
    load_error: Option<String>,
    library: CourseLibrary,
    session: TrainingSession,
    editor: EditorSession,
    profiles: SharedProfiles,
    new_learner_name: String,
    // course file waiting for the user to discard unpublished edits
    pending_switch: Option<PathBuf>,
    mode: Mode,
    status_line: String,
    // editor buffers for the active phrase
    edit_phrase_id: Option<String>,
    edit_text: String,
    edit_i18n_text: String,
    edit_sound: String,
}

fn single_learner(name: &str, threshold: u32) -> ProfileManager {
    let mut profiles = ProfileManager::new();
    let id = profiles.add_profile(name, threshold);
    if let Err(e) = profiles.set_active_profile(id) {
        warn!(error = %e, "could not activate learner");
    }
    profiles
}

impl PhraseDrillApp {
    fn new(_cc: &eframe::CreationContext<'_>, args: Args) -> Self {
        let mut config_val = None;
        let mut config_error_val = None;
        match config::load_config_from_file(&args.config) {
            Ok(loaded_config) => {
                info!(content_dir = %loaded_config.content_project_dir, "config loaded");
                config_val = Some(loaded_config);
            }
            Err(e) => {
                error!(path = %args.config.display(), error = %e, "error loading config");
                config_error_val = Some(e.to_string());
            }
        }

        let (name, threshold) = config_val
            .as_ref()
            .map_or(("learner".to_string(), 3), |c| (c.learner_name.clone(), c.learned_threshold));
        let profiles = match &config_val {
            Some(c) => load_or_create_profile(&c.profile_file(), &name, threshold).unwrap_or_else(|e| {
                warn!(error = %e, "could not load learner profiles, starting fresh");
                single_learner(&name, threshold)
            }),
            None => single_learner(&name, threshold),
        };
        let profiles = SharedProfiles::new(profiles);

        let mut library = CourseLibrary::new();
        let mut session = TrainingSession::new().with_sink(Box::new(profiles.clone()));
        session.watch(library.subscribe());

        let mut app = Self {
            config: config_val,
            config_error: config_error_val,
            course_files: Vec::new(),
            selected_course_file: None,
            scan_error: None,
            load_error: None,
            library,
            session,
            editor: EditorSession::new(),
            profiles,
            new_learner_name: String::new(),
            pending_switch: None,
            mode: Mode::Training,
            status_line: String::new(),
            edit_phrase_id: None,
            edit_text: String::new(),
            edit_i18n_text: String::new(),
            edit_sound: String::new(),
        };
        app.scan_course_directory();
        if let Some(path) = args.course {
            app.load_course(&path);
        }
        app
    }

    fn scan_course_directory(&mut self) {
        self.course_files.clear();
        self.scan_error = None;
        let Some(conf) = &self.config else {
            self.scan_error = Some("Config not loaded.".to_string());
            return;
        };
        match scan_course_dir(Path::new(&conf.content_project_dir)) {
            Ok(files) if files.is_empty() => {
                self.scan_error = Some("No .json or .course.txt files found.".to_string());
            }
            Ok(files) => self.course_files = files,
            Err(e) => self.scan_error = Some(format!("Failed to read content directory: {}", e)),
        }

        match scan_skeleton_dir(Path::new(&conf.content_project_dir)) {
            Ok(skeleton_files) => {
                for path in skeleton_files {
                    match load_skeleton_file(&path) {
                        Ok(skeleton) => self.library.add_skeleton(skeleton),
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping skeleton"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not scan for skeletons"),
        }
    }

    /// Switches courses unless that would drop unpublished editor changes.
    fn request_course(&mut self, path: &Path) {
        if self.editor.is_modified() {
            warn!(path = %path.display(), "unpublished edits, asking before switching course");
            self.status_line = "Unpublished edits in the editor. Publish or discard them first.".to_string();
            self.pending_switch = Some(path.to_path_buf());
            return;
        }
        self.load_course(path);
    }

    fn load_course(&mut self, path: &Path) {
        self.load_error = None;
        self.pending_switch = None;
        match load_course_file(path) {
            Ok(course) => {
                let course = self.library.replace(course);
                self.session.set_course(Some(course.clone()));
                self.editor.set_course((*course).clone());
                self.edit_phrase_id = None;
                self.selected_course_file = Some(path.to_path_buf());
                self.status_line = format!("Loaded '{}'", course.title);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load course");
                self.load_error = Some(format!("{}: {}", path.display(), e));
            }
        }
    }

    fn save_profile(&mut self) {
        let Some(conf) = &self.config else {
            return;
        };
        let path = conf.profile_file();
        if let Err(e) = save_profile_snapshot(&self.profiles.borrow(), &path) {
            error!(error = %e, "failed to save learner profile");
            self.status_line = format!("Profile not saved: {}", e);
        }
    }

    fn handle_session_events(&mut self) {
        self.session.sync();
        for event in self.session.drain_events() {
            if event == SessionEvent::Completed {
                self.status_line = "Session complete!".to_string();
                self.save_profile();
            }
        }
    }

    fn active_phrase_view(&self) -> Option<PhraseView> {
        let unit = self.session.active_unit()?;
        let phrase = self.session.active_phrase()?;
        Some(PhraseView {
            unit_title: unit.title.clone(),
            text: phrase.text.clone(),
            i18n_text: phrase.i18n_text.clone(),
            sound: phrase.sound.clone().unwrap_or_default(),
            phonemes: phrase.phonemes.join(" "),
        })
    }

    fn training_panel(&mut self, ui: &mut egui::Ui) {
        let Some(course) = self.session.course().cloned() else {
            ui.label("Select a course from the list.");
            return;
        };
        ui.heading(format!("{} ({})", course.title, course.language.title));
        ui.separator();

        let units: Vec<(String, String)> = self
            .session
            .trainable_actions()
            .groups()
            .iter()
            .map(|g| (g.unit_id.clone(), g.title.clone()))
            .collect();
        let active_unit_id = self.session.active_unit().map(|u| u.id.clone());
        ui.horizontal_wrapped(|ui| {
            for (unit_id, title) in &units {
                let is_selected = active_unit_id.as_deref() == Some(unit_id.as_str());
                if ui.selectable_label(is_selected, title).clicked() {
                    self.session.set_unit(unit_id);
                }
            }
        });
        ui.separator();

        match self.session.state() {
            SessionState::Idle => {
                ui.label("This course has no phrases with recordings yet.");
            }
            SessionState::Completed => {
                ui.heading("Session complete!");
                if ui.button("Train again").clicked() {
                    self.session.restart();
                }
            }
            SessionState::Active => {
                if self.profiles.borrow().active_profile().is_none() {
                    ui.colored_label(egui::Color32::YELLOW, "No active learner, judgments are not recorded.");
                }
                let Some(view) = self.active_phrase_view() else {
                    return;
                };
                let (done, total) = self.session.progress();
                ui.label(format!("{} | phrase {} of {}", view.unit_title, done, total));
                ui.add_space(10.0);
                ui.label(egui::RichText::new(&view.text).size(32.0).strong());
                if !view.i18n_text.is_empty() {
                    ui.label(egui::RichText::new(&view.i18n_text).italics());
                }
                ui.label(format!("Recording: {}", view.sound));
                if !view.phonemes.is_empty() {
                    ui.label(format!("Phonemes: {}", view.phonemes));
                }
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.add_enabled(self.session.has_previous(), egui::Button::new("< Previous")).clicked() {
                        self.session.previous_phrase();
                    }
                    if ui.button("Accept").clicked() {
                        self.session.accept();
                    }
                    if ui.button("Skip").clicked() {
                        self.session.skip();
                    }
                    if ui.button("Reject").clicked() {
                        self.session.reject();
                    }
                    if ui.add_enabled(self.session.has_next(), egui::Button::new("Next >")).clicked() {
                        self.session.next_phrase();
                    }
                });
            }
        }
    }

    fn sync_edit_buffers(&mut self) {
        let active = self.editor.active_phrase();
        let active_id = active.map(|p| p.id.clone());
        if active_id == self.edit_phrase_id {
            return;
        }
        self.edit_text = active.map(|p| p.text.clone()).unwrap_or_default();
        self.edit_i18n_text = active.map(|p| p.i18n_text.clone()).unwrap_or_default();
        self.edit_sound = active.and_then(|p| p.sound.clone()).unwrap_or_default();
        self.edit_phrase_id = active_id;
    }

    fn editor_panel(&mut self, ui: &mut egui::Ui) {
        if self.editor.course().is_none() {
            ui.label("Select a course from the list.");
            return;
        }
        self.sync_edit_buffers();

        if self.editor.skeleton_mode(&self.library) {
            ui.label(egui::RichText::new("Skeleton mode").italics());
        }
        let unit_title = self.editor.active_unit().map(|u| u.title.clone()).unwrap_or_default();
        let unit_id = self.editor.active_unit().map(|u| u.id.clone());
        ui.heading(format!("Editing unit: {}", unit_title));
        ui.horizontal(|ui| {
            if ui.add_enabled(self.editor.has_previous_phrase(), egui::Button::new("< Previous")).clicked() {
                self.editor.switch_to_previous_phrase();
            }
            if ui.add_enabled(self.editor.has_next_phrase(), egui::Button::new("Next >")).clicked() {
                self.editor.switch_to_next_phrase();
            }
        });
        ui.separator();

        if self.edit_phrase_id.is_some() {
            ui.horizontal(|ui| {
                ui.label("Text:");
                ui.text_edit_singleline(&mut self.edit_text);
            });
            ui.horizontal(|ui| {
                ui.label("Translation:");
                ui.text_edit_singleline(&mut self.edit_i18n_text);
            });
            ui.horizontal(|ui| {
                ui.label("Recording:");
                ui.text_edit_singleline(&mut self.edit_sound);
            });
            if ui.button("Apply").clicked() {
                let (text, i18n_text, sound) = (
                    self.edit_text.clone(),
                    self.edit_i18n_text.clone(),
                    self.edit_sound.trim().to_string(),
                );
                self.editor.edit_active_phrase(|p| {
                    p.text = text;
                    p.i18n_text = i18n_text;
                    p.sound = if sound.is_empty() { None } else { Some(sound) };
                });
            }
        } else {
            ui.label("This course has no phrases yet.");
        }
        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Add unit").clicked() {
                self.editor.add_unit();
            }
            if let Some(unit_id) = &unit_id {
                if ui.button("Add phrase to unit").clicked() {
                    if let Err(e) = self.editor.add_phrase(unit_id) {
                        self.status_line = format!("Could not add phrase: {}", e);
                    }
                }
            }
            let linked = self.editor.course().and_then(|c| c.foreign_id.clone());
            if let Some(skeleton_id) = linked {
                if ui.button("Update from skeleton").clicked() {
                    self.status_line = match self.editor.update_course_from_skeleton(&self.library) {
                        Ok(true) => format!("Imported new items from '{}'", skeleton_id),
                        Ok(false) => format!("Course is up to date with '{}'", skeleton_id),
                        Err(e) => format!("Skeleton update failed: {}", e),
                    };
                }
            }
            let label = if self.editor.is_modified() { "Save & publish *" } else { "Save & publish" };
            if ui.button(label).clicked() {
                self.save_and_publish();
            }
        });
    }

    fn save_and_publish(&mut self) {
        let (Some(conf), Some(course)) = (&self.config, self.editor.course()) else {
            return;
        };
        let path = PathBuf::from(&conf.content_project_dir).join(format!("{}.json", course.id));
        if let Err(e) = save_course(course, &path) {
            error!(error = %e, "failed to save course");
            self.status_line = format!("Course not saved: {}", e);
            return;
        }
        // training session rebuilds once it sees the library notification
        self.editor.publish(&mut self.library);
        self.status_line = format!("Saved to {}", path.display());
        self.scan_course_directory();
    }
}

impl App for PhraseDrillApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_session_events();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Profile", |ui| {
                    if ui.button("Save Learner Profile").clicked() {
                        self.save_profile();
                    }
                    if ui.button("Reset Learner Profile").clicked() {
                        if let Some(profile) = self.profiles.borrow_mut().active_profile_mut() {
                            profile.reset();
                        }
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.label(&self.status_line);
        });

        egui::SidePanel::left("side_panel_left").min_width(220.0).default_width(280.0).show(ctx, |ui| {
            ui.heading("Courses");
            ui.separator();
            if let Some(err) = &self.config_error {
                ui.colored_label(egui::Color32::RED, format!("Config: {}", err));
            } else if let Some(conf) = &self.config {
                ui.colored_label(egui::Color32::GREEN, format!("Content Dir: {}", conf.content_project_dir));
            }
            if ui.button("Rescan").clicked() {
                self.scan_course_directory();
            }
            if let Some(err) = &self.scan_error {
                ui.colored_label(egui::Color32::RED, err);
            }

            egui::ScrollArea::vertical().id_source("course_files_scroll").max_height(250.0).show(ui, |ui| {
                let mut path_to_load_onclick = None;
                for p in &self.course_files {
                    let fname = p.file_name().unwrap_or_default().to_string_lossy().into_owned();
                    let is_selected = self.selected_course_file.as_ref() == Some(p);
                    if ui.selectable_label(is_selected, fname).clicked() && !is_selected {
                        path_to_load_onclick = Some(p.clone());
                    }
                }
                if let Some(p_clicked) = path_to_load_onclick {
                    self.request_course(&p_clicked);
                }
            });
            if let Some(err) = &self.load_error {
                ui.colored_label(egui::Color32::RED, err);
            }
            if let Some(pending) = self.pending_switch.clone() {
                ui.colored_label(egui::Color32::YELLOW, "Unpublished edits will be lost.");
                ui.horizontal(|ui| {
                    if ui.button("Discard and switch").clicked() {
                        self.load_course(&pending);
                    }
                    if ui.button("Cancel").clicked() {
                        self.pending_switch = None;
                    }
                });
            }
            ui.separator();

            ui.collapsing("Learner Profiles", |ui| {
                let learners: Vec<(u32, String)> = self
                    .profiles
                    .borrow()
                    .profiles()
                    .iter()
                    .map(|p| (p.id, p.name.clone()))
                    .collect();
                let active_id = self.profiles.borrow().active_profile().map(|p| p.id);
                for (id, name) in learners {
                    if ui.selectable_label(active_id == Some(id), name).clicked() {
                        if let Err(e) = self.profiles.borrow_mut().set_active_profile(id) {
                            warn!(error = %e, "could not switch learner");
                        }
                    }
                }
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.new_learner_name);
                    let name = self.new_learner_name.trim().to_string();
                    if ui.add_enabled(!name.is_empty(), egui::Button::new("Add")).clicked() {
                        let threshold = self.config.as_ref().map_or(3, |c| c.learned_threshold);
                        self.profiles.borrow_mut().add_profile(name, threshold);
                        self.new_learner_name.clear();
                    }
                });
                ui.separator();
                let profiles = self.profiles.borrow();
                if let Some(profile) = profiles.active_profile() {
                    ui.label(format!("Learner: {}", profile.name));
                    ui.label(format!("Known phrases: {}", profile.count_known()));
                    ui.label(format!("Practicing: {}", profile.count_active()));
                    ui.label(format!("Judgments: {}", profile.total_judgments()));
                } else {
                    ui.label("No active learner.");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.mode, Mode::Training, "Training");
                ui.selectable_value(&mut self.mode, Mode::Editing, "Editing");
            });
            ui.separator();
            match self.mode {
                Mode::Training => self.training_panel(ui),
                Mode::Editing => self.editor_panel(ui),
            }
        });
    }
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phrasedrill_rust_gui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(config = %args.config.display(), "starting phrase drill");

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Phrase Drill",
        options,
        Box::new(move |cc| Box::new(PhraseDrillApp::new(cc, args))),
    )
}
