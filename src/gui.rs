use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use particle_field::{
    Axis, Color, Experiment, FieldFunction, GalaxyParams, SceneSession, ScreenFieldParams,
};
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

/// Something the panel wants the host to do after this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelRequest {
    SwitchExperiment(Experiment),
    Regenerate,
}

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,
    /// Edited copies of the regenerating parameters; written back to the
    /// session only when a control finishes changing.
    pub galaxy_draft: GalaxyParams,
    pub field_draft: ScreenFieldParams,
    /// A picked colour waiting for the pointer to be released
    pub color_pending: bool,
    pub requests: Vec<PanelRequest>,
}

impl UiState {
    pub fn new(session: &SceneSession) -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,
            galaxy_draft: session.galaxy.clone(),
            field_draft: session.field_params.clone(),
            color_pending: false,
            requests: Vec::new(),
        }
    }

    /// Drop uncommitted edits.
    pub fn sync_from(&mut self, session: &SceneSession) {
        self.galaxy_draft = session.galaxy.clone();
        self.field_draft = session.field_params.clone();
        self.color_pending = false;
    }
}

/// A control is committed when its drag ends or it changed without a drag
/// (typed value, checkbox, dropdown).
fn committed(response: &egui::Response) -> bool {
    response.drag_stopped() || (response.changed() && !response.dragged())
}

/// Colour pickers report a change on every frame of a drag inside their
/// popup, so the edit is held until the pointer is released.
fn settle_color(pending: &mut bool, changed: bool, pointer_down: bool) -> bool {
    *pending |= changed;
    if *pending && !pointer_down {
        *pending = false;
        true
    } else {
        false
    }
}

fn color_button(ui: &mut egui::Ui, label: &str, color: &mut Color) -> egui::Response {
    ui.horizontal(|ui| {
        let mut srgb = color.to_rgb8();
        let response = ui.color_edit_button_srgb(&mut srgb);
        if response.changed() {
            *color = Color::from_rgb8(srgb[0], srgb[1], srgb[2]);
        }
        ui.label(label);
        response
    })
    .inner
}

pub struct Gui {
    context: Context,
    state: State,
    renderer: Renderer,
}

impl Gui {
    pub fn new(device: &Device, output_color_format: TextureFormat, window: &Window) -> Self {
        let context = Context::default();
        let id = context.viewport_id();

        let state = State::new(
            context.clone(),
            id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = Renderer::new(
            device,
            output_color_format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                ..Default::default()
            },
        );

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    /// True while the pointer is over a panel; scene input is ignored then.
    pub fn wants_pointer(&self) -> bool {
        self.context.wants_pointer_input()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        ui_state: &mut UiState,
        session: &mut SceneSession,
    ) {
        let raw_input = self.state.take_egui_input(window);

        let full_output = self.context.run(raw_input, |ctx| {
            Self::ui(ctx, ui_state, session);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        let mut render_pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        self.renderer
            .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        drop(render_pass);

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn ui(ctx: &Context, state: &mut UiState, session: &mut SceneSession) {
        // Diagnostics Panel (Top Left)
        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", state.fps));
                ui.label(format!("Frame Time: {:.2} ms", state.frame_time));
                ui.label(format!("Particles: {}", session.particle_count()));
                ui.label(format!("Generation: {}", session.generation()));
            });

        // Experiment Controls (Top Right)
        egui::Window::new(session.experiment().title())
            .id(egui::Id::new("experiment_controls"))
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                let mut selected = session.experiment();
                egui::ComboBox::from_label("Experiment")
                    .selected_text(selected.title())
                    .show_ui(ui, |ui| {
                        for experiment in Experiment::ALL {
                            ui.selectable_value(&mut selected, experiment, experiment.title());
                        }
                    });
                if selected != session.experiment() {
                    state.requests.push(PanelRequest::SwitchExperiment(selected));
                }

                ui.separator();
                match session.experiment() {
                    Experiment::Galaxy => Self::galaxy_controls(ui, state, session),
                    Experiment::Animation => Self::animation_controls(ui, session),
                    Experiment::Field => Self::field_controls(ui, state, session),
                }

                ui.separator();
                if ui.button("Regenerate").clicked() {
                    session.galaxy = state.galaxy_draft.clone();
                    session.field_params = state.field_draft.clone();
                    state.requests.push(PanelRequest::Regenerate);
                }
            });
    }

    fn galaxy_controls(ui: &mut egui::Ui, state: &mut UiState, session: &mut SceneSession) {
        let draft = &mut state.galaxy_draft;
        let mut commit = false;

        ui.heading("Shape");
        commit |= committed(
            &ui.add(
                egui::Slider::new(&mut draft.particle_count, 100..=1_000_000)
                    .step_by(100.0)
                    .logarithmic(true)
                    .text("Particles"),
            ),
        );
        commit |= committed(
            &ui.add(
                egui::Slider::new(&mut draft.size, 0.001..=1.0)
                    .logarithmic(true)
                    .text("Size"),
            ),
        );
        commit |= committed(&ui.add(egui::Slider::new(&mut draft.radius, 1.0..=20.0).text("Radius")));
        commit |= committed(&ui.add(egui::Slider::new(&mut draft.segments, 2..=20).text("Segments")));
        commit |= committed(
            &ui.add(egui::Slider::new(&mut draft.angle_offset, 0.0..=20.0).text("Angle Offset")),
        );

        ui.separator();
        ui.heading("Noise");
        commit |= committed(
            &ui.add(egui::Slider::new(&mut draft.proximity, 1.0..=10.0).text("Proximity")),
        );
        commit |= committed(
            &ui.add(egui::Slider::new(&mut draft.strength, 0.01..=5.0).text("Strength")),
        );
        let max_height = draft.radius.max(0.1);
        commit |= committed(
            &ui.add(
                egui::Slider::new(&mut draft.height_factor, 0.1..=max_height).text("Height Factor"),
            ),
        );

        ui.separator();
        ui.heading("Colors");
        let mut color_changed = color_button(ui, "Center", &mut draft.center_color).changed();
        color_changed |= color_button(ui, "Border", &mut draft.border_color).changed();
        let pointer_down = ui.input(|i| i.pointer.any_down());
        commit |= settle_color(&mut state.color_pending, color_changed, pointer_down);

        ui.separator();
        ui.heading("Motion");
        ui.add(
            egui::Slider::new(&mut session.galaxy.rotation_speed, 0.0..=1.0)
                .text("Rotation Speed"),
        );
        draft.rotation_speed = session.galaxy.rotation_speed;

        if commit {
            session.galaxy = draft.clone();
            state.requests.push(PanelRequest::Regenerate);
        }
    }

    fn animation_controls(ui: &mut egui::Ui, session: &mut SceneSession) {
        let animation = &mut session.animation;

        ui.heading("Field");
        egui::ComboBox::from_label("Function")
            .selected_text(animation.function.label())
            .show_ui(ui, |ui| {
                for function in FieldFunction::ALL {
                    ui.selectable_value(&mut animation.function, function, function.label());
                }
            });
        egui::ComboBox::from_label("Axis")
            .selected_text(animation.axis.to_string())
            .show_ui(ui, |ui| {
                for axis in [Axis::Y, Axis::Z] {
                    ui.selectable_value(&mut animation.axis, axis, axis.to_string());
                }
            });

        ui.separator();
        ui.heading("Rendering");
        ui.add(
            egui::Slider::new(&mut animation.size, 0.005..=0.5)
                .logarithmic(true)
                .text("Size"),
        );
        ui.checkbox(&mut animation.use_uniform_color, "Uniform Color");
        ui.add_enabled_ui(animation.use_uniform_color, |ui| {
            color_button(ui, "Color", &mut animation.color);
        });
    }

    fn field_controls(ui: &mut egui::Ui, state: &mut UiState, session: &mut SceneSession) {
        let draft = &mut state.field_draft;
        let mut commit = false;

        ui.heading("Particles");
        commit |= committed(
            &ui.add(
                egui::Slider::new(&mut draft.particle_count, 100..=100_000)
                    .logarithmic(true)
                    .text("Count"),
            ),
        );
        commit |= committed(&ui.add(egui::Slider::new(&mut draft.size, 0.1..=10.0).text("Size")));
        commit |= committed(&ui.checkbox(&mut draft.use_random_colors, "Random Colors"));
        let color_changed = !draft.use_random_colors
            && color_button(ui, "Base Color", &mut draft.base_color).changed();
        let pointer_down = ui.input(|i| i.pointer.any_down());
        commit |= settle_color(&mut state.color_pending, color_changed, pointer_down);

        ui.separator();
        ui.heading("Pointer");
        let repulsion = &mut session.field_params.repulsion;
        ui.add(egui::Slider::new(&mut repulsion.mouse_radius, 10.0..=1000.0).text("Mouse Radius"));
        ui.add(egui::Slider::new(&mut repulsion.move_distance, 1.0..=500.0).text("Move Distance"));
        ui.add(egui::Slider::new(&mut repulsion.return_speed, 0.01..=1.0).text("Return Speed"));
        draft.repulsion = *repulsion;

        if commit {
            session.field_params = draft.clone();
            state.requests.push(PanelRequest::Regenerate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_field::Viewport;

    #[test]
    fn test_drafts_start_from_session() {
        let mut session =
            SceneSession::new(Experiment::Field, Viewport::new(640.0, 480.0), Some(1)).unwrap();
        session.field_params.particle_count = 321;

        let mut state = UiState::new(&session);
        assert_eq!(state.field_draft.particle_count, 321);

        state.field_draft.particle_count = 999;
        state.sync_from(&session);
        assert_eq!(state.field_draft.particle_count, 321);
        assert!(state.requests.is_empty());
    }

    #[test]
    fn test_color_commits_on_release() {
        let mut pending = false;

        assert!(!settle_color(&mut pending, true, true));
        assert!(!settle_color(&mut pending, true, true));
        assert!(!settle_color(&mut pending, false, true));
        assert!(settle_color(&mut pending, false, false));
        assert!(!pending);
        assert!(!settle_color(&mut pending, false, false));

        // A click-to-pick with no drag commits on the same frame.
        assert!(settle_color(&mut pending, true, false));
    }
}
