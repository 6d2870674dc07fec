//! Orbit demo application
//!
//! Drives a small sun / planet / moon hierarchy through the full frame loop
//! on the headless backend: a shadow pass into an offscreen target, the main
//! pass into the backbuffer and a periodic reflection probe into a cube
//! target. Prints the draw statistics at the end.
//!
//! Usage: `orbit_demo [config.toml|config.ron] [frames]`

use std::rc::Rc;

use snuff_engine::config::ConfigError;
use snuff_engine::foundation::logging;
use snuff_engine::prelude::*;
use snuff_engine::render::backends::headless::RecordingContext;
use snuff_engine::render::{RenderError, RenderResult};
use snuff_engine::scene::SceneError;

const FRAME_TIME: f32 = 1.0 / 60.0;
const PROBE_INTERVAL: u64 = 30;
const SPHERE_RINGS: u32 = 16;
const SPHERE_SEGMENTS: u32 = 32;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

struct Bodies {
    sun: NodeId,
    planet: NodeId,
    moon: NodeId,
}

struct Resources {
    sphere: Rc<Geometry>,
    lit: Rc<Material>,
    caster: Rc<Material>,
    probe: Rc<Material>,
    shadow_map: RenderTarget,
    reflection_probe: RenderTarget,
}

fn main() {
    if let Err(error) = run() {
        log::error!("{error}");
        eprintln!("orbit_demo failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    let frames: u64 = match args.next() {
        Some(count) => count
            .parse()
            .map_err(|_| DemoError::InvalidArgument(format!("frame count '{count}'")))?,
        None => 120,
    };

    if let Err(error) = logging::init_with_filter(&config.log_filter) {
        eprintln!("Logger already installed: {error}");
    }
    log::info!("Starting orbit demo for {} frames", frames);

    let mut tree = TransformTree::new();
    let bodies = build_hierarchy(&mut tree)?;
    let mut camera = Camera::with_config(&mut tree, &config.camera);
    tree.set_local_translation(camera.node(), Vec3::new(0.0, 3.0, 12.0))?;

    let mut context = RecordingContext::new(1280, 720);
    let resources = load_resources(&mut context);
    let mut renderer = Renderer::new(context, config.renderer.clone());

    for _ in 0..frames {
        let angle = renderer.elapsed_time() * 30.0;
        tree.set_rotation_euler(bodies.sun, 0.0, angle, 0.0)?;
        tree.set_rotation_euler(bodies.planet, 0.0, angle * 4.0, 0.0)?;

        render_frame(&mut renderer, &mut tree, &mut camera, &bodies, &resources)?;
    }

    let moon = tree.world_translation(bodies.moon)?;
    log::info!(
        "Rendered {} frames, {} draws, average {:.1} fps, moon at ({:.2}, {:.2}, {:.2})",
        renderer.frame_count(),
        renderer.context().draw_count(),
        renderer.clock().average_fps(),
        moon.x,
        moon.y,
        moon.z
    );
    println!(
        "{} frames, {} draw calls",
        renderer.frame_count(),
        renderer.context().draw_count()
    );
    Ok(())
}

fn build_hierarchy(tree: &mut TransformTree) -> Result<Bodies, SceneError> {
    let sun = tree.create_node();
    tree.set_local_scale(sun, Vec3::new(2.0, 2.0, 2.0))?;

    let planet = tree.create_node();
    tree.attach(planet, sun)?;
    tree.set_local_translation(planet, Vec3::new(3.0, 0.0, 0.0))?;
    tree.set_local_scale(planet, Vec3::new(0.25, 0.25, 0.25))?;

    let moon = tree.create_node();
    tree.attach(moon, planet)?;
    tree.set_local_translation(moon, Vec3::new(2.0, 0.0, 0.0))?;
    tree.set_local_scale(moon, Vec3::new(0.5, 0.5, 0.5))?;

    Ok(Bodies { sun, planet, moon })
}

fn load_resources(context: &mut RecordingContext) -> Resources {
    let lit_program = context.create_program(
        &["Position", "Normal"],
        &["Projection", "View", "Model", "InvTransposedModel", "EyePosition", "Time", "tex0"],
    );
    let lit_layout = ShaderLayout::new()
        .with_attribute("Position", "vec3")
        .with_attribute("Normal", "vec3")
        .with_uniform("Projection", "mat4")
        .with_uniform("View", "mat4")
        .with_uniform("Model", "mat4")
        .with_uniform("InvTransposedModel", "mat3")
        .with_uniform("EyePosition", "vec3")
        .with_uniform("Time", "float")
        .with_uniform("tex0", "sampler2D");

    let depth_program = context.create_program(&["Position"], &["Projection", "View", "Model"]);
    let depth_layout = ShaderLayout::new()
        .with_attribute("Position", "vec3")
        .with_uniform("Projection", "mat4")
        .with_uniform("View", "mat4")
        .with_uniform("Model", "mat4");

    let lit_pass = || Pass::new("Default", lit_program, PassState::default(), &lit_layout, &*context);
    let shadow_pass = Pass::new(
        "Shadow",
        depth_program,
        PassState::default().with_cull(snuff_engine::render::CullMode::Front),
        &depth_layout,
        &*context,
    );
    let reflection_pass = Pass::new("Reflection", lit_program, PassState::default(), &lit_layout, &*context);

    let effect = Rc::new(
        Effect::new("Planet")
            .with_technique("Default", Technique::new().with_pass(lit_pass()))
            .with_technique("Caster", Technique::new().with_pass(shadow_pass).with_pass(lit_pass()))
            .with_technique("Probe", Technique::new().with_pass(reflection_pass)),
    );

    // UV sphere with duplicated seam vertices
    let sphere_vertices = ((SPHERE_RINGS + 1) * (SPHERE_SEGMENTS + 1)) as usize;
    let sphere_index_count = SPHERE_RINGS * SPHERE_SEGMENTS * 6;
    let positions = context.create_buffer();
    let normals = context.create_buffer();
    let indices = context.create_buffer();
    let sphere = Rc::new(
        Geometry::new("sphere")
            .with_attribute("Position", positions, 3)
            .with_attribute("Normal", normals, 3)
            .with_indices(indices, sphere_index_count, IndexWidth::for_vertex_count(sphere_vertices)),
    );

    let surface = context.create_texture();
    let shadow_map = RenderTarget::new(context.create_framebuffer(), 1024, 1024);
    let reflection_probe = RenderTarget::cube(context.create_framebuffer(), 256);

    Resources {
        sphere,
        lit: Rc::new(Material::new("sun", Rc::clone(&effect)).with_texture(surface)),
        caster: Rc::new(Material::new("rock", Rc::clone(&effect)).with_technique("Caster")),
        probe: Rc::new(Material::new("probe", effect).with_technique("Probe")),
        shadow_map,
        reflection_probe,
    }
}

fn render_frame(
    renderer: &mut Renderer<RecordingContext>,
    tree: &mut TransformTree,
    camera: &mut Camera,
    bodies: &Bodies,
    resources: &Resources,
) -> RenderResult<()> {
    renderer.queue(bodies.sun, Rc::clone(&resources.sphere), Rc::clone(&resources.lit), None)?;
    for body in [bodies.planet, bodies.moon] {
        renderer.queue(body, Rc::clone(&resources.sphere), Rc::clone(&resources.caster), None)?;
    }

    if renderer.frame_count() % PROBE_INTERVAL == 0 {
        for body in [bodies.sun, bodies.planet, bodies.moon] {
            renderer.queue(body, Rc::clone(&resources.sphere), Rc::clone(&resources.probe), None)?;
        }
        if renderer.set_target(Some(resources.reflection_probe)) {
            renderer.clear(None);
            let drawn = renderer.render_pass(tree, camera, "Reflection");
            log::debug!("Reflection probe: {} draws", drawn);
        }
    }

    if renderer.set_target(Some(resources.shadow_map)) {
        renderer.clear(Some([1.0, 1.0, 1.0, 1.0]));
        renderer.render_pass(tree, camera, "Shadow");
    }

    renderer.set_target(None);
    renderer.clear(None);
    renderer.render_pass(tree, camera, "Default");

    renderer.render(FRAME_TIME)
}
