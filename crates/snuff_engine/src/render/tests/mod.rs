//! Pipeline tests for queueing, pass replay and per-draw bindings
//!
//! Everything runs against the headless [`RecordingContext`]; assertions
//! inspect the draws it recorded and the uniform values current at each.

use std::rc::Rc;

use approx::assert_relative_eq;

use super::backends::headless::{DrawCall, GraphicsCommand, RecordingContext};
use super::*;
use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{Camera, CubeFace, NodeId, TransformTree};

const UNIFORMS: [&str; 9] = [
    "Projection",
    "View",
    "InvViewDirProjection",
    "EyePosition",
    "Time",
    "Model",
    "InvTransposedModel",
    "tex0",
    "Tint",
];

struct Fixture {
    renderer: Renderer<RecordingContext>,
    tree: TransformTree,
    camera: Camera,
    effect: Rc<Effect>,
    geometry: Rc<Geometry>,
    material: Rc<Material>,
    lit_program: ProgramHandle,
    shadow_program: ProgramHandle,
}

impl Fixture {
    fn new() -> Self {
        let mut context = RecordingContext::new(800, 600);

        let lit_program = context.create_program(&["Position", "Normal"], &UNIFORMS);
        let lit_layout = ShaderLayout::new()
            .with_attribute("Position", "vec3")
            .with_attribute("Normal", "vec3")
            .with_uniform("Projection", "mat4")
            .with_uniform("View", "mat4")
            .with_uniform("InvViewDirProjection", "mat4")
            .with_uniform("EyePosition", "vec3")
            .with_uniform("Time", "float")
            .with_uniform("Model", "mat4")
            .with_uniform("InvTransposedModel", "mat3")
            .with_uniform("tex0", "sampler2D")
            .with_uniform("Tint", "float");

        let shadow_program = context.create_program(&["Position"], &["Model"]);
        let shadow_layout = ShaderLayout::new()
            .with_attribute("Position", "vec3")
            .with_uniform("Model", "mat4");

        let lit = || Pass::new("Default", lit_program, PassState::default(), &lit_layout, &context);
        let effect = Rc::new(
            Effect::new("Lit")
                .with_technique("Default", Technique::new().with_pass(lit()))
                .with_technique(
                    "Shadowed",
                    Technique::new()
                        .with_pass(Pass::new(
                            "Shadow",
                            shadow_program,
                            PassState::default().with_cull(CullMode::Front),
                            &shadow_layout,
                            &context,
                        ))
                        .with_pass(lit()),
                ),
        );

        let positions = context.create_buffer();
        let indices = context.create_buffer();
        let geometry = Rc::new(
            Geometry::new("cube")
                .with_attribute("Position", positions, 3)
                .with_indices(indices, 36, IndexWidth::U16),
        );
        let material = Rc::new(Material::new("stone", Rc::clone(&effect)));

        let renderer = Renderer::new(context, RendererConfig::default());
        let mut tree = TransformTree::new();
        let camera = Camera::new(&mut tree);

        Self {
            renderer,
            tree,
            camera,
            effect,
            geometry,
            material,
            lit_program,
            shadow_program,
        }
    }

    fn node_at(&mut self, position: Vec3) -> NodeId {
        let node = self.tree.create_node();
        self.tree.set_local_translation(node, position).unwrap();
        node
    }

    fn queue(&mut self, node: NodeId) -> RenderResult<usize> {
        self.renderer
            .queue(node, Rc::clone(&self.geometry), Rc::clone(&self.material), None)
    }

    fn render_pass(&mut self, pass: &str) -> usize {
        self.renderer.render_pass(&mut self.tree, &mut self.camera, pass)
    }

    fn slot(&self, name: &str) -> u32 {
        self.renderer.context().uniform_slot(self.lit_program, name).unwrap()
    }

    fn draws(&self) -> Vec<DrawCall> {
        self.renderer.context().draw_calls().cloned().collect()
    }
}

fn mat4_at(draw: &DrawCall, slot: u32) -> Mat4 {
    match draw.uniforms.get(&slot) {
        Some(UniformValue::Mat4(matrix)) => *matrix,
        other => panic!("expected a mat4 at slot {slot}, found {other:?}"),
    }
}

fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

#[test]
fn test_second_drain_of_same_pass_draws_nothing() {
    let mut fixture = Fixture::new();
    let a = fixture.node_at(Vec3::new(0.0, 0.0, -5.0));
    let b = fixture.node_at(Vec3::new(1.0, 0.0, -5.0));

    fixture.queue(a).unwrap();
    fixture.queue(b).unwrap();

    assert_eq!(fixture.render_pass("Default"), 2);
    assert_eq!(fixture.render_pass("Default"), 0);
    assert_eq!(fixture.renderer.context().draw_count(), 2);
}

#[test]
fn test_bucket_drains_in_queue_order_and_frames_are_isolated() {
    let mut fixture = Fixture::new();
    let nodes: Vec<NodeId> = (1..=3)
        .map(|i| fixture.node_at(Vec3::new(i as f32, 0.0, 0.0)))
        .collect();
    for &node in &nodes {
        fixture.queue(node).unwrap();
    }
    assert_eq!(fixture.renderer.render_queue().phase(), FramePhase::Accumulating);

    assert_eq!(fixture.render_pass("Default"), 3);

    let model = fixture.slot("Model");
    let order: Vec<f32> = fixture
        .draws()
        .iter()
        .map(|draw| translation_of(&mat4_at(draw, model)).x)
        .collect();
    assert_eq!(order, vec![1.0, 2.0, 3.0]);

    fixture.renderer.render(0.016).unwrap();
    assert_eq!(fixture.renderer.frame_count(), 1);
    assert_eq!(fixture.renderer.render_queue().phase(), FramePhase::Idle);
    assert_eq!(fixture.render_pass("Default"), 0);
}

#[test]
fn test_undrained_entries_do_not_survive_the_frame() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();

    fixture.renderer.render(0.016).unwrap();

    assert!(fixture.renderer.render_queue().is_empty());
    assert_eq!(fixture.render_pass("Default"), 0);
    assert!(matches!(
        fixture.renderer.context().commands().last(),
        Some(GraphicsCommand::Present)
    ));
}

#[test]
fn test_cube_target_replays_bucket_per_face() {
    let mut fixture = Fixture::new();
    let framebuffer = fixture.renderer.context_mut().create_framebuffer();
    assert!(fixture.renderer.set_target(Some(RenderTarget::cube(framebuffer, 128))));

    let eye = Vec3::new(1.0, 2.0, 3.0);
    fixture
        .tree
        .set_local_translation(fixture.camera.node(), eye)
        .unwrap();
    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();

    assert_eq!(fixture.render_pass("Default"), 6);

    let draws = fixture.draws();
    assert_eq!(draws.len(), 6);

    let faces: Vec<Option<CubeFace>> = draws.iter().map(|draw| draw.face).collect();
    let expected: Vec<Option<CubeFace>> = CubeFace::ALL.iter().copied().map(Some).collect();
    assert_eq!(faces, expected);

    let view_slot = fixture.slot("View");
    let eye_slot = fixture.slot("EyePosition");
    let views: Vec<Mat4> = draws.iter().map(|draw| mat4_at(draw, view_slot)).collect();
    for (i, view) in views.iter().enumerate() {
        for other in &views[i + 1..] {
            assert!(!approx::relative_eq!(*view, *other, epsilon = 1e-5));
        }
    }
    for draw in &draws {
        assert_eq!(draw.framebuffer, Some(framebuffer));
        assert_eq!(draw.uniforms.get(&eye_slot), Some(&UniformValue::Vec3(eye)));
    }
}

#[test]
fn test_cube_face_projection_is_square_ninety_degrees() {
    let mut fixture = Fixture::new();
    let framebuffer = fixture.renderer.context_mut().create_framebuffer();
    fixture.renderer.set_target(Some(RenderTarget::cube(framebuffer, 64)));
    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();
    fixture.render_pass("Default");

    let projection = mat4_at(&fixture.draws()[0], fixture.slot("Projection"));
    assert_relative_eq!(projection[(0, 0)], 1.0, epsilon = 1e-5);
    assert_relative_eq!(projection[(1, 1)], 1.0, epsilon = 1e-5);
}

#[test]
fn test_queue_fans_out_into_every_technique_pass() {
    let mut fixture = Fixture::new();
    let material = Rc::new(Material::new("caster", Rc::clone(&fixture.effect)).with_technique("Shadowed"));
    let node = fixture.node_at(Vec3::zeros());

    let passes = fixture
        .renderer
        .queue(node, Rc::clone(&fixture.geometry), material, None)
        .unwrap();
    assert_eq!(passes, 2);
    assert_eq!(fixture.renderer.render_queue().entry_count(), 2);

    assert_eq!(fixture.render_pass("Shadow"), 1);
    assert_eq!(fixture.render_pass("Default"), 1);

    let programs: Vec<Option<ProgramHandle>> = fixture.draws().iter().map(|draw| draw.program).collect();
    assert_eq!(programs, vec![Some(fixture.shadow_program), Some(fixture.lit_program)]);
    assert!(fixture
        .renderer
        .context()
        .commands()
        .contains(&GraphicsCommand::PassState(PassState::default().with_cull(CullMode::Front))));
}

#[test]
fn test_standard_uniforms_bound_only_when_declared() {
    let mut fixture = Fixture::new();
    let material = Rc::new(Material::new("caster", Rc::clone(&fixture.effect)).with_technique("Shadowed"));
    let node = fixture.node_at(Vec3::new(0.0, 1.0, 0.0));
    fixture
        .renderer
        .queue(node, Rc::clone(&fixture.geometry), material, None)
        .unwrap();

    fixture.render_pass("Shadow");
    let shadow_draw = fixture.draws()[0].clone();
    assert_eq!(shadow_draw.uniforms.len(), 1);

    fixture.render_pass("Default");
    let lit_draw = fixture.draws()[1].clone();
    // Everything but tex0 and Tint
    assert_eq!(lit_draw.uniforms.len(), 7);
    assert!(matches!(
        lit_draw.uniforms.get(&fixture.slot("InvTransposedModel")),
        Some(UniformValue::Mat3(_))
    ));

    let projection = fixture.camera.projection_matrix(800, 600).unwrap();
    assert_eq!(mat4_at(&lit_draw, fixture.slot("Projection")), projection);
}

#[test]
fn test_model_reflects_ancestor_moves_made_after_queueing() {
    let mut fixture = Fixture::new();
    let parent = fixture.node_at(Vec3::zeros());
    let child = fixture.node_at(Vec3::new(1.0, 0.0, 0.0));
    fixture.tree.attach(child, parent).unwrap();

    fixture.queue(child).unwrap();
    fixture
        .tree
        .set_local_translation(parent, Vec3::new(5.0, 0.0, 0.0))
        .unwrap();
    fixture.render_pass("Default");

    let model = mat4_at(&fixture.draws()[0], fixture.slot("Model"));
    assert_relative_eq!(translation_of(&model), Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_time_uniform_accumulates_frame_deltas() {
    let mut fixture = Fixture::new();
    fixture.renderer.render(0.25).unwrap();
    fixture.renderer.render(0.5).unwrap();

    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();
    fixture.render_pass("Default");

    let time = fixture.draws()[0].uniforms.get(&fixture.slot("Time")).cloned();
    assert_eq!(time, Some(UniformValue::Float(0.75)));
    assert_eq!(fixture.renderer.frame_count(), 2);
}

#[test]
fn test_custom_uniforms_skip_undeclared_names() {
    let mut fixture = Fixture::new();
    let mut uniforms = CustomUniforms::new();
    uniforms.set_float("Tint", 0.25).set_vec3("Undeclared", Vec3::new(1.0, 1.0, 1.0));
    let node = fixture.node_at(Vec3::zeros());

    fixture
        .renderer
        .queue(
            node,
            Rc::clone(&fixture.geometry),
            Rc::clone(&fixture.material),
            Some(Rc::new(uniforms)),
        )
        .unwrap();

    assert_eq!(fixture.render_pass("Default"), 1);
    let draw = fixture.draws()[0].clone();
    assert_eq!(draw.uniforms.get(&fixture.slot("Tint")), Some(&UniformValue::Float(0.25)));
    assert!(!draw.uniforms.values().any(|value| *value == UniformValue::Vec3(Vec3::new(1.0, 1.0, 1.0))));
}

#[test]
fn test_custom_uniform_named_like_attribute_is_skipped() {
    let mut fixture = Fixture::new();
    // Attribute and uniform slots are numbered independently, both start at 0
    let program = fixture.renderer.context_mut().create_program(&["Position"], &["Tint"]);
    let layout = ShaderLayout::new()
        .with_attribute("Position", "vec3")
        .with_uniform("Tint", "vec3");
    let pass = Pass::new("Default", program, PassState::default(), &layout, fixture.renderer.context());
    let effect = Rc::new(Effect::new("Flat").with_technique("Default", Technique::new().with_pass(pass)));
    let material = Rc::new(Material::new("flat", effect));

    let positions = fixture.renderer.context_mut().create_buffer();
    let tints = fixture.renderer.context_mut().create_buffer();
    let indices = fixture.renderer.context_mut().create_buffer();
    let geometry = Rc::new(
        Geometry::new("tinted")
            .with_attribute("Position", positions, 3)
            .with_attribute("Tint", tints, 3)
            .with_indices(indices, 3, IndexWidth::U16),
    );

    let mut uniforms = CustomUniforms::new();
    uniforms.set_vec3("Position", Vec3::new(9.0, 9.0, 9.0));
    let node = fixture.node_at(Vec3::zeros());
    fixture
        .renderer
        .queue(node, geometry, material, Some(Rc::new(uniforms)))
        .unwrap();
    assert_eq!(fixture.render_pass("Default"), 1);

    let tint_slot = fixture.renderer.context().uniform_slot(program, "Tint").unwrap();
    let draw = fixture.draws()[0].clone();
    assert_eq!(draw.uniforms.get(&tint_slot), None);

    let attributes: Vec<&GraphicsCommand> = fixture
        .renderer
        .context()
        .commands()
        .iter()
        .filter(|command| matches!(command, GraphicsCommand::VertexAttribute { .. }))
        .collect();
    assert_eq!(attributes.len(), 1);
    assert!(matches!(
        attributes[0],
        GraphicsCommand::VertexAttribute { buffer, .. } if *buffer == positions
    ));
}

#[test]
fn test_inv_view_dir_projection_ignores_camera_translation() {
    let mut fixture = Fixture::new();
    let eye = fixture.camera.node();
    fixture.tree.set_local_translation(eye, Vec3::new(3.0, -2.0, 7.0)).unwrap();
    fixture.tree.set_rotation_euler(eye, 20.0, 35.0, 0.0).unwrap();

    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();
    fixture.render_pass("Default");
    let first = mat4_at(&fixture.draws()[0], fixture.slot("InvViewDirProjection"));

    let projection = fixture.camera.projection_matrix(800, 600).unwrap();
    let mut rotation_only = fixture.tree.world_to_local(eye).unwrap();
    rotation_only[(0, 3)] = 0.0;
    rotation_only[(1, 3)] = 0.0;
    rotation_only[(2, 3)] = 0.0;
    let expected = (projection * rotation_only).try_inverse().unwrap();
    assert_relative_eq!(first, expected, epsilon = 1e-4);

    fixture.renderer.render(1.0 / 60.0).unwrap();
    fixture.tree.set_local_translation(eye, Vec3::new(-40.0, 5.0, 1.0)).unwrap();
    fixture.queue(node).unwrap();
    fixture.render_pass("Default");
    let moved = mat4_at(&fixture.draws()[1], fixture.slot("InvViewDirProjection"));
    assert_relative_eq!(moved, first, epsilon = 1e-4);
}

#[test]
fn test_textures_bound_to_declared_units_only() {
    let mut fixture = Fixture::new();
    let albedo = fixture.renderer.context_mut().create_texture();
    let detail = fixture.renderer.context_mut().create_texture();
    let material = Rc::new(
        Material::new("textured", Rc::clone(&fixture.effect))
            .with_texture(albedo)
            .with_texture(detail),
    );
    let node = fixture.node_at(Vec3::zeros());
    fixture
        .renderer
        .queue(node, Rc::clone(&fixture.geometry), material, None)
        .unwrap();
    fixture.render_pass("Default");

    let commands = fixture.renderer.context().commands();
    let bound: Vec<&GraphicsCommand> = commands
        .iter()
        .filter(|command| matches!(command, GraphicsCommand::BindTexture { .. }))
        .collect();
    assert_eq!(bound, vec![&GraphicsCommand::BindTexture { unit: 0, texture: albedo }]);
    assert!(commands.contains(&GraphicsCommand::Sampler {
        location: fixture.slot("tex0"),
        unit: 0
    }));
}

#[test]
fn test_vertex_attributes_follow_layout() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();
    fixture.render_pass("Default");

    let attributes: Vec<&GraphicsCommand> = fixture
        .renderer
        .context()
        .commands()
        .iter()
        .filter(|command| matches!(command, GraphicsCommand::VertexAttribute { .. }))
        .collect();
    // The geometry only provides Position; Normal stays unbound
    assert_eq!(attributes.len(), 1);
    assert!(matches!(
        attributes[0],
        GraphicsCommand::VertexAttribute { location: 0, components: 3, .. }
    ));

    let draw = fixture.draws()[0].clone();
    assert_eq!(draw.index_count, 36);
    assert_eq!(draw.index_width, IndexWidth::U16);
    assert_eq!(draw.topology, PrimitiveTopology::Triangles);
}

#[test]
fn test_invalid_material_is_not_queued() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());

    let pending = Rc::new(Material::pending("loading"));
    let result = fixture
        .renderer
        .queue(node, Rc::clone(&fixture.geometry), pending, None);
    assert_eq!(result, Err(RenderError::InvalidMaterial("loading".to_string())));

    let unknown_technique =
        Rc::new(Material::new("odd", Rc::clone(&fixture.effect)).with_technique("Wireframe"));
    assert!(fixture
        .renderer
        .queue(node, Rc::clone(&fixture.geometry), unknown_technique, None)
        .is_err());

    let empty = Rc::new(Geometry::new("empty"));
    let result = fixture
        .renderer
        .queue(node, empty, Rc::clone(&fixture.material), None);
    assert_eq!(result, Err(RenderError::InvalidGeometry("empty".to_string())));

    assert!(fixture.renderer.render_queue().is_empty());
    assert_eq!(fixture.render_pass("Default"), 0);
}

#[test]
fn test_immediate_draw_with_unknown_pass_renders_nothing() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());
    let geometry = Rc::clone(&fixture.geometry);
    let material = Rc::clone(&fixture.material);

    let result = fixture.renderer.draw(
        &mut fixture.tree,
        &mut fixture.camera,
        node,
        &geometry,
        &material,
        None,
        Some("Outline"),
    );

    assert_eq!(
        result,
        Err(RenderError::UnknownPass {
            technique: "Default".to_string(),
            pass: "Outline".to_string()
        })
    );
    assert_eq!(fixture.renderer.context().draw_count(), 0);
}

#[test]
fn test_immediate_draw_uses_default_pass_and_skips_queue() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());
    let geometry = Rc::clone(&fixture.geometry);
    let material = Rc::clone(&fixture.material);

    let drawn = fixture
        .renderer
        .draw(&mut fixture.tree, &mut fixture.camera, node, &geometry, &material, None, None)
        .unwrap();

    assert_eq!(drawn, 1);
    assert!(fixture.renderer.render_queue().is_empty());
    assert_eq!(fixture.draws()[0].program, Some(fixture.lit_program));
}

#[test]
fn test_device_failure_skips_draw_without_aborting_frame() {
    let mut fixture = Fixture::new();
    let node = fixture.node_at(Vec3::zeros());
    fixture.renderer.context_mut().set_fail_draws(true);
    fixture.queue(node).unwrap();

    assert_eq!(fixture.render_pass("Default"), 0);
    assert!(fixture.renderer.render(0.016).is_ok());

    fixture.renderer.context_mut().set_fail_draws(false);
    fixture.queue(node).unwrap();
    assert_eq!(fixture.render_pass("Default"), 1);
}

#[test]
fn test_degenerate_viewport_consumes_bucket_without_drawing() {
    let mut fixture = Fixture::new();
    fixture.renderer.context_mut().resize(800, 0);
    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();

    assert_eq!(fixture.render_pass("Default"), 0);
    assert!(fixture.renderer.render_queue().is_empty());
}

#[test]
fn test_flat_target_sizes_viewport_and_projection() {
    let mut fixture = Fixture::new();
    let framebuffer = fixture.renderer.context_mut().create_framebuffer();
    assert!(fixture.renderer.set_target(Some(RenderTarget::new(framebuffer, 256, 128))));
    assert!(fixture
        .renderer
        .context()
        .commands()
        .contains(&GraphicsCommand::Viewport { width: 256, height: 128 }));

    let node = fixture.node_at(Vec3::zeros());
    fixture.queue(node).unwrap();
    assert_eq!(fixture.render_pass("Default"), 1);

    let draw = fixture.draws()[0].clone();
    assert_eq!(draw.face, None);
    let projection = mat4_at(&draw, fixture.slot("Projection"));
    // 90° vertical FOV at 2:1
    assert_relative_eq!(projection[(0, 0)], 0.5, epsilon = 1e-5);
}

#[test]
fn test_set_target_rejects_unknown_framebuffer() {
    let mut fixture = Fixture::new();
    let valid = fixture.renderer.context_mut().create_framebuffer();
    fixture.renderer.set_target(Some(RenderTarget::new(valid, 64, 64)));

    let missing = RenderTarget::new(FramebufferHandle(404), 64, 64);
    assert!(!fixture.renderer.set_target(Some(missing)));
    assert_eq!(fixture.renderer.target().map(RenderTarget::framebuffer), Some(valid));

    assert!(fixture.renderer.set_target(None));
    assert!(fixture.renderer.target().is_none());
}

#[test]
fn test_clear_uses_configured_color() {
    let mut fixture = Fixture::new();
    fixture.renderer.clear(None);
    fixture.renderer.clear(Some([1.0, 0.0, 0.0, 1.0]));

    let clears: Vec<&GraphicsCommand> = fixture
        .renderer
        .context()
        .commands()
        .iter()
        .filter(|command| matches!(command, GraphicsCommand::Clear(_)))
        .collect();
    assert_eq!(
        clears,
        vec![
            &GraphicsCommand::Clear(RendererConfig::default().clear_color),
            &GraphicsCommand::Clear([1.0, 0.0, 0.0, 1.0]),
        ]
    );
}

#[test]
fn test_clearing_cube_target_clears_every_face() {
    let mut fixture = Fixture::new();
    let framebuffer = fixture.renderer.context_mut().create_framebuffer();
    fixture.renderer.set_target(Some(RenderTarget::cube(framebuffer, 32)));
    fixture.renderer.context_mut().take_commands();

    fixture.renderer.clear(None);

    let clears = fixture
        .renderer
        .context()
        .commands()
        .iter()
        .filter(|command| matches!(command, GraphicsCommand::Clear(_)))
        .count();
    assert_eq!(clears, 6);
}
