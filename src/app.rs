use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::body_pass::{BodyPass, DrawCall, FrameUniforms};
use crate::config::{OrreryConfig, SceneConfig};
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::mesh::Mesh;
use crate::orbit_camera::OrbitCamera;
use crate::orrery::{BodyDescriptor, BodyKind, Orrery};
use crate::simulation::Simulation;
use crate::sphere::SphereBuilder;
use crate::texture::Texture;

/// Open a window and run the orrery until it is closed.
///
/// The body list is validated before any window is created. Startup failures
/// (GPU, textures, meshes) close the event loop and are returned here.
///
/// # Example
/// ```no_run
/// let config = orrery::OrreryConfig::default();
/// if let Err(err) = orrery::run(config) {
///     eprintln!("{err}");
/// }
/// ```
pub fn run(config: OrreryConfig) -> Result<(), AppError> {
    let orrery = config.orrery()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = OrreryApp::Pending { config, orrery };
    event_loop.run_app(&mut app)?;

    match app {
        OrreryApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum OrreryApp {
    Pending {
        config: OrreryConfig,
        orrery: Orrery,
    },
    Running(Box<Running>),
    Failed(AppError),
}

/// GPU resources for one body, in evaluation order.
struct BodyResources {
    kind: BodyKind,
    /// Index into `Running::meshes`.
    mesh: usize,
    lit: bool,
    bind_group: wgpu::BindGroup,
    #[allow(dead_code)]
    texture: Texture,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    body_pass: BodyPass,
    meshes: Vec<Mesh>,
    bodies: Vec<BodyResources>,
    orrery: Orrery,
    simulation: Simulation,
    camera: OrbitCamera,
    input: Input,
    scene: SceneConfig,
    title: String,
    last_frame: Instant,
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let OrreryApp::Pending { config, orrery } = self {
            match Running::new(event_loop, config, orrery.clone()) {
                Ok(running) => {
                    running.window.request_redraw();
                    *self = OrreryApp::Running(Box::new(running));
                }
                Err(err) => {
                    *self = OrreryApp::Failed(err);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let OrreryApp::Running(app) = self else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if app.input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if app.input.key_pressed(KeyCode::Space) {
                    app.toggle_pause();
                }

                app.redraw();

                app.input.begin_frame();
                app.window.request_redraw();
            }
            _ => {}
        }
    }
}

impl Running {
    fn new(
        event_loop: &ActiveEventLoop,
        config: &OrreryConfig,
        orrery: Orrery,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window.width,
                config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone(), config.window.vsync)?;
        let body_pass = BodyPass::new(&gpu, orrery.bodies().len());

        let mut meshes = Vec::new();
        let mut mesh_by_radius: HashMap<u32, usize> = HashMap::new();
        let mut bodies = Vec::with_capacity(orrery.bodies().len());

        for body in orrery.bodies() {
            let mesh = match mesh_by_radius.get(&body.radius.to_bits()) {
                Some(&index) => index,
                None => {
                    let geometry = SphereBuilder::new(body.radius)
                        .step(config.scene.sphere_step)
                        .outward_normals(config.scene.outward_normals)
                        .build()?;
                    log::info!(
                        "Built sphere mesh r={} ({} vertices, {} triangles)",
                        body.radius,
                        geometry.vertex_count(),
                        geometry.triangle_count()
                    );
                    meshes.push(Mesh::from_geometry(
                        &gpu,
                        &geometry,
                        &format!("Sphere r={}", body.radius),
                    ));
                    mesh_by_radius.insert(body.radius.to_bits(), meshes.len() - 1);
                    meshes.len() - 1
                }
            };

            let texture = load_texture(&gpu, body)?;
            let bind_group = body_pass.create_texture_bind_group(&gpu, &texture);
            bodies.push(BodyResources {
                kind: body.kind,
                mesh,
                lit: !body.emissive,
                bind_group,
                texture,
            });
        }

        let simulation = if config.scene.start_paused {
            Simulation::paused()
        } else {
            Simulation::new()
        };

        let running = Self {
            window,
            gpu,
            body_pass,
            meshes,
            bodies,
            orrery,
            simulation,
            camera: OrbitCamera::from_config(&config.camera),
            input: Input::new(),
            scene: config.scene.clone(),
            title: config.window.title.clone(),
            last_frame: Instant::now(),
        };
        running.update_title();
        Ok(running)
    }

    fn toggle_pause(&mut self) {
        self.simulation = self.simulation.toggled();
        if self.simulation.is_running() {
            log::info!("Resumed at t={:.3}", self.simulation.time());
        } else {
            log::info!("Paused at t={:.3}", self.simulation.time());
        }
        self.update_title();
    }

    fn update_title(&self) {
        self.window
            .set_title(&window_title(&self.title, self.simulation.is_running()));
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.simulation = self.simulation.advance(dt);
        self.camera.update(&self.input);
        let transforms = self.orrery.evaluate(self.simulation.time());
        log::trace!(
            "Frame dt={dt:.4} t={:.4} bodies={}",
            self.simulation.time(),
            transforms.len()
        );

        self.body_pass.ensure_depth_size(&self.gpu);

        let Some(output) = self.gpu.acquire_frame() else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Orrery Encoder"),
            });

        let frame_uniforms = FrameUniforms::new(
            &self.camera.camera(),
            self.gpu.aspect(),
            Vec3::from_array(self.scene.light_direction),
            self.scene.ambient,
        );
        let draw_calls: Vec<DrawCall> = self
            .bodies
            .iter()
            .filter_map(|body| {
                transforms.get(body.kind).map(|model| DrawCall {
                    mesh: &self.meshes[body.mesh],
                    model,
                    lit: body.lit,
                    texture: &body.bind_group,
                })
            })
            .collect();

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Body Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(self.scene.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.body_pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.body_pass
                .render(&self.gpu, &mut render_pass, frame_uniforms, &draw_calls);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Loads a body's image, or a flat tint texture when it names none.
fn load_texture(gpu: &GpuContext, body: &BodyDescriptor) -> Result<Texture, AppError> {
    match body.texture.as_deref() {
        Some(path) => Texture::from_file(gpu, path).map_err(|source| AppError::Texture {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            log::info!("No texture for {}, using its tint", body.kind);
            Ok(Texture::solid(gpu, body.tint, body.kind.name()))
        }
    }
}

fn window_title(base: &str, running: bool) -> String {
    if running {
        base.to_string()
    } else {
        format!("{base} (paused)")
    }
}

fn clear_color([r, g, b, a]: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: f64::from(a),
    }
}
