//! Interactive L-system tree editor built with eframe/egui.
//!
//! This module defines [`Editor`], which owns a [`TreeWorkspace`] (history,
//! growth clock, configuration), a [`PreviewScene`] that receives welded
//! meshes, and a [`FilePicker`] for open/save dialogs, and implements
//! [`eframe::App`] to drive them from an egui UI.

use std::path::Path;

use eframe::App;
use glam::{Vec2, Vec3};
use lsys_core::{
    clock::{ClockState, Direction},
    config::{GrowthConfig, MeshConfig},
    node::{LSystemNode, NodeType},
    sample,
    workspace::TreeWorkspace,
};
use rand::rng;

use crate::{
    picker::{FileFormat, FilePicker},
    preview::PreviewScene,
};

/// Name given to trees published to the preview scene.
const TREE_NAME: &str = "lsystem";

/// Upper bound on wireframe triangles drawn per frame.
const MAX_WIRE_TRIANGLES: usize = 20_000;

/// Plane the 3-D tree is flattened onto for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Looking down -z: screen x = world x, screen up = world y.
    Front,
    /// Looking down +x: screen x = world z, screen up = world y.
    Side,
    /// Looking down -y: screen x = world x, screen up = world -z.
    Top,
}

impl Projection {
    pub fn project(self, p: Vec3) -> Vec2 {
        match self {
            Projection::Front => Vec2::new(p.x, p.y),
            Projection::Side => Vec2::new(p.z, p.y),
            Projection::Top => Vec2::new(p.x, -p.z),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Projection::Front => "Front",
            Projection::Side => "Side",
            Projection::Top => "Top",
        }
    }
}

/// Main application state for the editor.
///
/// The per-frame update is:
/// 1. Handle UI interactions (file actions, clock controls, config edits).
/// 2. [`TreeWorkspace::tick`] to turn elapsed clock time into growth, and
///    rebuild the preview mesh if growth changed anything.
/// 3. Draw node segments and the preview wireframe.
pub struct Editor {
    workspace: TreeWorkspace,
    scene: PreviewScene,
    picker: Box<dyn FilePicker>,

    rng: rand::rngs::ThreadRng,

    zoom: f32,
    pan: egui::Vec2,
    projection: Projection,
    show_wireframe: bool,
    auto_rebuild: bool,

    sample_depth: usize,
    sample_fanout: usize,

    status: String,
    last_frame_dt: f64,
}

impl Editor {
    /// Creates an editor with a random sample tree loaded.
    ///
    /// Growth runs with `time_scale = 1.0` so that clock seconds produce
    /// visible growth.
    pub fn new(picker: Box<dyn FilePicker>) -> Self {
        let mut workspace = TreeWorkspace::new();
        workspace.growth.time_scale = 1.0;

        let mut editor = Self {
            workspace,
            scene: PreviewScene::new(),
            picker,
            rng: rng(),
            zoom: 60.0,
            pan: egui::vec2(0.0, 150.0),
            projection: Projection::Front,
            show_wireframe: true,
            auto_rebuild: true,
            sample_depth: 4,
            sample_fanout: 2,
            status: String::new(),
            last_frame_dt: 0.0,
        };
        editor.load_sample();
        editor
    }

    /// Replaces the history with a fresh random tree.
    fn load_sample(&mut self) {
        let history = sample::random_history(self.sample_depth, self.sample_fanout, &mut self.rng);
        self.workspace.replace_history(history);
        self.rebuild_mesh();
        self.status = format!("Sample tree with {} nodes", self.workspace.node_count());
    }

    /// Drops all nodes and preview meshes.
    fn clear(&mut self) {
        self.workspace.clear();
        self.scene.clear();
        self.status = "Cleared".to_string();
    }

    /// Publishes the current history to the preview scene.
    fn rebuild_mesh(&mut self) {
        if self.workspace.publish(&mut self.scene, TREE_NAME).is_none() {
            self.scene.clear();
        }
    }

    fn open_file(&mut self, format: FileFormat) {
        let Some(path) = self.picker.pick_open(format) else {
            return;
        };
        self.open_path(format, &path);
    }

    fn open_path(&mut self, format: FileFormat, path: &Path) {
        let result = match format {
            FileFormat::Text => self.workspace.open_text(path),
            FileFormat::Binary => self.workspace.open_binary(path),
        };
        match result {
            Ok(()) => {
                self.rebuild_mesh();
                self.status = format!(
                    "Loaded {} generations from {}",
                    self.workspace.generations.len(),
                    path.display()
                );
            }
            Err(err) => {
                tracing::error!(%err, "open failed");
                self.status = format!("Open failed: {err}");
            }
        }
    }

    fn save_file(&mut self, format: FileFormat) {
        let Some(path) = self.picker.pick_save(format, TREE_NAME) else {
            return;
        };
        self.save_path(format, &path);
    }

    fn save_path(&mut self, format: FileFormat, path: &Path) {
        let result = match format {
            FileFormat::Text => self.workspace.save_text(path),
            FileFormat::Binary => self.workspace.save_binary(path),
        };
        self.status = match result {
            Ok(()) => format!("Saved {}", path.display()),
            Err(err) => {
                tracing::error!(%err, "save failed");
                format!("Save failed: {err}")
            }
        };
    }

    /// Advances growth and refreshes the preview mesh when nodes changed.
    fn step_growth(&mut self) {
        let changed = self.workspace.tick();
        if changed > 0 && self.auto_rebuild {
            self.rebuild_mesh();
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The position is first flattened by the current [`Projection`], then
    /// scaled by `zoom`, offset by `pan`, and centered in `rect`. Screen y
    /// is flipped so that positive plane y goes up.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        self.plane_to_screen(self.projection.project(p), rect)
    }

    fn plane_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Editor::plane_to_screen`].
    fn screen_to_plane(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn node_color(kind: NodeType) -> egui::Color32 {
        match kind {
            NodeType::Base => egui::Color32::from_rgb(110, 70, 40),
            NodeType::Forward => egui::Color32::from_rgb(139, 90, 43),
            NodeType::Branch => egui::Color32::from_rgb(160, 110, 60),
            NodeType::Twig => egui::Color32::from_rgb(180, 140, 90),
            NodeType::Leaf => egui::Color32::from_rgb(90, 170, 70),
            NodeType::Decal => egui::Color32::from_rgb(200, 200, 120),
        }
    }

    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(1.0));
        });
    }

    /// Builds the top panel: file actions, clock controls, view options.
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open text…").clicked() {
                        ui.close();
                        self.open_file(FileFormat::Text);
                    }
                    if ui.button("Save text…").clicked() {
                        ui.close();
                        self.save_file(FileFormat::Text);
                    }
                    ui.separator();
                    if ui.button("Open tree cache…").clicked() {
                        ui.close();
                        self.open_file(FileFormat::Binary);
                    }
                    if ui.button("Save tree cache…").clicked() {
                        ui.close();
                        self.save_file(FileFormat::Binary);
                    }
                });

                if ui.button("Sample").clicked() {
                    self.load_sample();
                }
                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();

                let running = self.workspace.clock().is_running();
                if ui
                    .button(if running { "⏸ Stop" } else { "▶ Start" })
                    .clicked()
                {
                    if running {
                        self.workspace.stop();
                    } else {
                        self.workspace.start();
                    }
                }
                let reversed = self.workspace.clock().is_reversed();
                if ui.selectable_label(reversed, "⟲ Reverse").clicked() {
                    self.workspace.reverse();
                }
                if ui.button("Reset").clicked() {
                    self.workspace.reset();
                    self.rebuild_mesh();
                }
                if ui.button("Build mesh").clicked() {
                    self.rebuild_mesh();
                }

                ui.separator();
                egui::ComboBox::from_id_salt("projection")
                    .selected_text(self.projection.label())
                    .show_ui(ui, |ui| {
                        for p in [Projection::Front, Projection::Side, Projection::Top] {
                            ui.selectable_value(&mut self.projection, p, p.label());
                        }
                    });
                ui.checkbox(&mut self.show_wireframe, "Wireframe");
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=400.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar, including the frame-time overlay.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let fps = if self.last_frame_dt > 0.0 {
                    1.0 / self.last_frame_dt
                } else {
                    0.0
                };
                ui.label(format!("{:.1} ms ({fps:.0} fps)", self.last_frame_dt * 1000.0));
                ui.separator();
                if let Some(entry) = self.scene.latest() {
                    ui.label(format!(
                        "{} #{} = {} verts / {} tris ({} in scene)",
                        entry.name,
                        entry.entity.0,
                        entry.mesh.vertex_count(),
                        entry.mesh.triangle_count(),
                        self.scene.entries().len()
                    ));
                }
                let clock = match self.workspace.clock().state() {
                    ClockState::Stopped => "stopped",
                    ClockState::Running(Direction::Forward) => "running",
                    ClockState::Running(Direction::Reverse) => "reversing",
                };
                ui.label(format!("t = {:.2} s ({clock})", self.workspace.elapsed_seconds()));
                ui.label(format!("nodes = {}", self.workspace.node_count()));
                ui.label(format!("generations = {}", self.workspace.generations.len()));
                ui.separator();
                ui.label(self.status.as_str());
            });
        });
    }

    /// Builds the right-hand panel for growth, mesh and sample settings.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Growth");
                Self::labeled_drag_f32(
                    ui,
                    "time_scale:",
                    &mut self.workspace.growth.time_scale,
                    0.0..=10.0,
                    0.01,
                );
                let mut clamp = self.workspace.growth.min_dimension.is_some();
                ui.checkbox(&mut clamp, "clamp to floor");
                let mut floor = self.workspace.growth.min_dimension.unwrap_or(0.0);
                if clamp {
                    Self::labeled_drag_f32(ui, "floor:", &mut floor, 0.0..=1.0, 0.001);
                }
                self.workspace.growth.min_dimension = clamp.then_some(floor);

                ui.separator();
                ui.label("Mesh");
                let mut segments = self.workspace.mesh.segments as usize;
                Self::labeled_drag_usize(
                    ui,
                    "segments:",
                    &mut segments,
                    MeshConfig::MIN_SEGMENTS as usize..=MeshConfig::MAX_SEGMENTS as usize,
                );
                let mut mesh_changed = segments as u32 != self.workspace.mesh.segments;
                self.workspace.mesh.segments = segments as u32;
                mesh_changed |=
                    Self::labeled_drag_f32(ui, "taper:", &mut self.workspace.mesh.taper, 0.0..=2.0, 0.01);
                ui.checkbox(&mut self.auto_rebuild, "rebuild while growing");
                if mesh_changed {
                    self.rebuild_mesh();
                }

                ui.separator();
                ui.label("Sample tree");
                Self::labeled_drag_usize(ui, "depth:", &mut self.sample_depth, 1..=8);
                Self::labeled_drag_usize(ui, "fan-out:", &mut self.sample_fanout, 1..=4);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.workspace.growth = GrowthConfig {
                        time_scale: 1.0,
                        ..GrowthConfig::default()
                    };
                    self.workspace.mesh = MeshConfig::default();
                    self.rebuild_mesh();
                }
            });
    }

    fn draw_node(&self, painter: &egui::Painter, rect: egui::Rect, node: &LSystemNode) {
        let a = self.world_to_screen(node.position, rect);
        let b = self.world_to_screen(node.top(), rect);
        let width = (node.radius * 2.0 * self.zoom).clamp(1.0, 40.0);
        painter.line_segment([a, b], egui::Stroke::new(width, Self::node_color(node.kind)));
    }

    fn draw_wireframe(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(entry) = self.scene.latest() else {
            return;
        };
        let mesh = &entry.mesh;
        let stroke = egui::Stroke::new(0.5, egui::Color32::from_white_alpha(40));

        for tri in mesh.indices.chunks_exact(3).take(MAX_WIRE_TRIANGLES) {
            let pts: Vec<egui::Pos2> = tri
                .iter()
                .filter_map(|&i| mesh.positions.get(i as usize))
                .map(|&p| self.world_to_screen(p, rect))
                .collect();
            if pts.len() == 3 {
                painter.add(egui::Shape::closed_line(pts, stroke));
            }
        }
    }

    /// Builds the central panel where the tree is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let plane_before = self.screen_to_plane(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 400.0);

                let screen_after = self.plane_to_screen(plane_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Ground line.
            let left = self.plane_to_screen(Vec2::new(-1000.0, 0.0), rect);
            let right = self.plane_to_screen(Vec2::new(1000.0, 0.0), rect);
            painter.line_segment(
                [left, right],
                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            );

            for node in self.workspace.generations.iter().flatten() {
                self.draw_node(&painter, rect, node);
            }

            if self.show_wireframe {
                self.draw_wireframe(&painter, rect);
            }

            if self.workspace.clock().is_running() {
                ctx.request_repaint();
            }
        });
    }
}

impl App for Editor {
    /// eframe callback that advances growth and builds all panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.last_frame_dt = ctx.input(|i| i.unstable_dt) as f64;
        self.step_growth();

        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
