//! Building and tearing down the 360° scene when a player is attached or detached.
//!
//! The scene is a sphere showing the video on its inside, and a camera at its center. Attaching a
//! [`PlaybackHandle`] builds it and starts motion sampling; detaching removes it and stops motion
//! sampling. Both go through [`PlaybackRequest`] events so they are ordered with play and pause.

use std::{fmt, sync::Arc};

use bevy_app::prelude::*;
use bevy_asset::{Assets, Handle, RenderAssetUsages};
use bevy_core_pipeline::core_3d::Camera3d;
use bevy_ecs::prelude::*;
use bevy_image::Image;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_pbr::{MeshMaterial3d, StandardMaterial};
use bevy_render::{
    mesh::{Mesh, Mesh3d, Meshable},
    prelude::*,
    render_resource::{Extent3d, Face, TextureDimension, TextureFormat},
};
use bevy_transform::prelude::*;

use crate::{
    controller::{
        component::{SphereCam, VideoSphere},
        fov::{self, FovLimits},
        SphereCamSystems,
    },
    math,
    motion::MotionSampler,
    playback::{PlaybackEvent, PlaybackHandle, VideoSurface},
};

/// Longitude and latitude subdivisions of the sphere mesh.
const SPHERE_SECTORS: u32 = 64;
const SPHERE_STACKS: u32 = 32;

/// Size of the video texture when none is given.
pub const DEFAULT_VIDEO_SIZE: UVec2 = UVec2::new(1280, 720);
/// Radius of the sphere when none is given.
pub const DEFAULT_SPHERE_RADIUS: f32 = 30.0;

/// Requests to the scene, processed in the order they were sent.
#[derive(Event, Clone)]
pub enum PlaybackRequest {
    /// Build a scene for this player, replacing any existing one.
    Attach {
        /// The player to show.
        handle: Arc<dyn PlaybackHandle>,
        /// Size of the video texture in pixels. Matching the video avoids resampling.
        video_size: UVec2,
        /// Radius of the sphere in world units.
        sphere_radius: f32,
    },
    /// Tear the scene down. Does nothing if there is no scene.
    Detach,
    /// Start playback through the video surface.
    Play,
    /// Pause playback through the video surface.
    Pause,
}

impl PlaybackRequest {
    /// Attach a player with the default video size and sphere radius.
    pub fn attach(handle: Arc<dyn PlaybackHandle>) -> Self {
        PlaybackRequest::Attach {
            handle,
            video_size: DEFAULT_VIDEO_SIZE,
            sphere_radius: DEFAULT_SPHERE_RADIUS,
        }
    }
}

impl fmt::Debug for PlaybackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackRequest::Attach {
                video_size,
                sphere_radius,
                ..
            } => f
                .debug_struct("Attach")
                .field("video_size", video_size)
                .field("sphere_radius", sphere_radius)
                .finish_non_exhaustive(),
            PlaybackRequest::Detach => f.write_str("Detach"),
            PlaybackRequest::Play => f.write_str("Play"),
            PlaybackRequest::Pause => f.write_str("Pause"),
        }
    }
}

/// Sent after the scene was built or torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub enum SceneEvent {
    /// A scene was built.
    Attached {
        /// The camera entity, carrying the [`SphereCam`].
        camera: Entity,
        /// The sphere entity, carrying the [`VideoSphere`].
        sphere: Entity,
    },
    /// The scene was torn down.
    Detached,
}

/// Describes the material the renderer should give the sphere.
///
/// Only the inside of the sphere is ever seen, so the material is double sided with front faces
/// culled. [`SphereSurface::build_meshes`] turns this into the sphere's mesh, material and
/// [`VideoTexture`].
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct SphereSurface {
    /// Size of the video texture in pixels.
    pub texture_size: UVec2,
    /// Render both sides of each polygon.
    pub double_sided: bool,
    /// Faces to skip.
    pub cull_mode: Option<Face>,
}

/// The image shown on the inside of the sphere. The host copies decoded video frames into it.
#[derive(Debug, Clone, Component)]
pub struct VideoTexture(pub Handle<Image>);

impl SphereSurface {
    /// The inside-only material for a video of the given size.
    pub fn inside(texture_size: UVec2) -> Self {
        Self {
            texture_size,
            double_sided: true,
            cull_mode: Some(Face::Front),
        }
    }

    /// A black texture of [`SphereSurface::texture_size`], waiting for the first video frame.
    pub fn blank_texture(&self) -> Image {
        Image::new_fill(
            Extent3d {
                width: self.texture_size.x,
                height: self.texture_size.y,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &[0, 0, 0, 255],
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        )
    }

    /// Unlit material showing `texture` on the inside of the sphere.
    pub fn material(&self, texture: Handle<Image>) -> StandardMaterial {
        StandardMaterial {
            base_color_texture: Some(texture),
            unlit: true,
            double_sided: self.double_sided,
            cull_mode: self.cull_mode,
            ..Default::default()
        }
    }

    /// Give every new video sphere its mesh, material and texture.
    ///
    /// Needs the mesh, material and image asset collections, normally added by the renderer
    /// plugins. Without them the spheres stay as plain entities.
    pub fn build_meshes(
        mut commands: Commands,
        spheres: Query<(Entity, &VideoSphere, &SphereSurface), Without<Mesh3d>>,
        meshes: Option<ResMut<Assets<Mesh>>>,
        materials: Option<ResMut<Assets<StandardMaterial>>>,
        images: Option<ResMut<Assets<Image>>>,
    ) {
        if spheres.is_empty() {
            return;
        }
        let (Some(mut meshes), Some(mut materials), Some(mut images)) = (meshes, materials, images)
        else {
            warn_once!("No mesh, material or image assets; video spheres will not be rendered.");
            return;
        };
        for (entity, sphere, surface) in &spheres {
            let mesh = Sphere::new(sphere.radius)
                .mesh()
                .uv(SPHERE_SECTORS, SPHERE_STACKS);
            let texture = images.add(surface.blank_texture());
            let material = materials.add(surface.material(texture.clone()));
            commands.entity(entity).insert((
                Mesh3d(meshes.add(mesh)),
                MeshMaterial3d(material),
                VideoTexture(texture),
            ));
            debug!("Built sphere mesh for {entity}");
        }
    }
}

struct AttachedScene {
    handle: Arc<dyn PlaybackHandle>,
    surface: Box<dyn VideoSurface>,
    camera: Entity,
    sphere: Entity,
    video_size: UVec2,
}

/// The scene currently built, if any.
#[derive(Resource, Default)]
pub struct SphereScene {
    attached: Option<AttachedScene>,
}

impl fmt::Debug for SphereScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SphereScene")
            .field("camera", &self.camera())
            .field("sphere", &self.sphere())
            .field("video_size", &self.attached.as_ref().map(|a| a.video_size))
            .finish()
    }
}

impl SphereScene {
    /// Is a player attached?
    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// The camera entity of the current scene.
    pub fn camera(&self) -> Option<Entity> {
        self.attached.as_ref().map(|a| a.camera)
    }

    /// The sphere entity of the current scene.
    pub fn sphere(&self) -> Option<Entity> {
        self.attached.as_ref().map(|a| a.sphere)
    }

    /// Is the attached player playing? Always asks the player, never the surface.
    pub fn is_playing(&self) -> bool {
        self.attached
            .as_ref()
            .is_some_and(|attached| attached.handle.is_playing())
    }

    /// Start playback through the video surface.
    pub fn play(&mut self) {
        let Some(attached) = self.attached.as_mut() else {
            debug!("Play requested with no player attached");
            return;
        };
        attached.surface.play();
        attached.handle.log(PlaybackEvent::Play);
    }

    /// Pause playback through the video surface.
    pub fn pause(&mut self) {
        let Some(attached) = self.attached.as_mut() else {
            debug!("Pause requested with no player attached");
            return;
        };
        attached.surface.pause();
        attached.handle.log(PlaybackEvent::Pause);
    }

    /// Build the scene for a player, tearing down any existing one first.
    pub fn attach(
        &mut self,
        commands: &mut Commands,
        sampler: &mut MotionSampler,
        handle: Arc<dyn PlaybackHandle>,
        video_size: UVec2,
        sphere_radius: f32,
    ) -> Option<SceneEvent> {
        if !(sphere_radius.is_finite() && sphere_radius > 0.0) {
            warn!("Ignoring attach with invalid sphere radius {sphere_radius}");
            return None;
        }
        if video_size.x == 0 || video_size.y == 0 {
            warn!("Ignoring attach with empty video size {video_size}");
            return None;
        }
        self.detach(commands, sampler);

        let mut surface = handle.create_surface(video_size);
        surface.pause();

        let sphere = commands
            .spawn((
                VideoSphere {
                    radius: sphere_radius,
                },
                SphereSurface::inside(video_size),
                Transform::from_rotation(math::sphere_rest_orientation()),
            ))
            .id();

        let controller = SphereCam::new(sphere, sphere_radius);
        let mut projection = Projection::Perspective(PerspectiveProjection::default());
        fov::apply_to_projection(&mut projection, FovLimits::default().default_fov());
        let camera = commands
            .spawn((
                Camera3d::default(),
                Camera::default(),
                projection,
                Transform::from_rotation(math::rest_orientation()),
                controller,
            ))
            .id();

        self.attached = Some(AttachedScene {
            handle,
            surface,
            camera,
            sphere,
            video_size,
        });
        sampler.start();
        info!("Attached 360° scene: {video_size} video on a sphere of radius {sphere_radius}");
        Some(SceneEvent::Attached { camera, sphere })
    }

    /// Remove the scene and stop motion sampling. Idempotent.
    pub fn detach(
        &mut self,
        commands: &mut Commands,
        sampler: &mut MotionSampler,
    ) -> Option<SceneEvent> {
        sampler.stop();
        let attached = self.attached.take()?;
        commands.entity(attached.camera).despawn();
        commands.entity(attached.sphere).despawn();
        info!("Detached 360° scene");
        Some(SceneEvent::Detached)
    }

    /// Process all [`PlaybackRequest`]s sent since the last frame, in order.
    pub fn receive_requests(
        mut commands: Commands,
        mut requests: EventReader<PlaybackRequest>,
        mut scene: ResMut<SphereScene>,
        mut sampler: ResMut<MotionSampler>,
        mut events: EventWriter<SceneEvent>,
    ) {
        for request in requests.read() {
            let event = match request {
                PlaybackRequest::Attach {
                    handle,
                    video_size,
                    sphere_radius,
                } => scene.attach(
                    &mut commands,
                    &mut sampler,
                    handle.clone(),
                    *video_size,
                    *sphere_radius,
                ),
                PlaybackRequest::Detach => scene.detach(&mut commands, &mut sampler),
                PlaybackRequest::Play => {
                    scene.play();
                    None
                }
                PlaybackRequest::Pause => {
                    scene.pause();
                    None
                }
            };
            if let Some(event) = event {
                events.write(event);
            }
        }
    }
}

/// Adds the [`SphereScene`] resource and processes [`PlaybackRequest`]s.
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SphereScene>()
            .init_resource::<MotionSampler>()
            .add_event::<PlaybackRequest>()
            .add_event::<SceneEvent>()
            .add_systems(
                Update,
                (SphereScene::receive_requests, SphereSurface::build_meshes)
                    .chain()
                    .in_set(SphereCamSystems::Scene),
            );
    }
}
