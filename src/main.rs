use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy_egui::{egui, EguiContexts, EguiPlugin};
use cs_core::{CsCorePlugin, Faction, Mulberry32};
use cs_entity::{
    tick_caravans, tick_npcs, CaravanId, CaravanKind, CaravanManager, CsEntityPlugin, Interaction,
    NpcId, NpcKind, NpcManager,
};
use cs_persistence::{ensure_saves_dir, save_game, save_path, try_load, CsPersistencePlugin, SaveData};
use cs_player::{attack_caravan, CsPlayerPlugin, Player};
use cs_terrain::{
    entity_texture, ground_texture, CsTerrainPlugin, EntityTheme, GroundTheme, HeightField,
    TerrainConfig, TextureData,
};
use std::collections::HashMap;

/// World seed shared by terrain, entities and combat.
const WORLD_SEED: u32 = 5123;
/// Maximum distance at which an attack connects with a caravan.
const ATTACK_RANGE: f32 = 2.0;
/// Maximum distance at which NPC interactions light up.
const INTERACT_RANGE: f32 = 4.0;
/// Side length of the composed ground texture in pixels.
const GROUND_TEXTURE_SIZE: usize = 1024;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Caravan Saga".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .add_plugins((
            CsCorePlugin,
            CsTerrainPlugin {
                config: TerrainConfig::default(),
            },
            CsEntityPlugin { seed: WORLD_SEED },
            CsPlayerPlugin,
            CsPersistencePlugin,
        ))
        .init_resource::<PlayerInput>()
        .init_resource::<HudState>()
        .insert_resource(CombatRng(Mulberry32::derive(WORLD_SEED, 3)))
        .add_systems(PostStartup, setup_scene)
        .add_systems(
            Update,
            (
                read_input,
                apply_player_movement,
                resolve_attack,
                tick_caravans,
                tick_npcs,
                update_interact_highlight,
                handle_save_load,
                sync_caravan_visuals,
                sync_npc_visuals,
                sync_player_skin,
                sync_player_visual,
            )
                .chain(),
        )
        .add_systems(Update, hud_ui)
        .run();
}

/// Per-frame player intent collected from the keyboard.
#[derive(Resource, Default)]
struct PlayerInput {
    direction: Vec2,
    attack: bool,
    save: bool,
    load: bool,
}

/// Messages shown by the HUD.
#[derive(Resource, Default)]
struct HudState {
    last_loot: Option<String>,
    status: String,
}

/// Dedicated stream for loot and injury rolls.
#[derive(Resource)]
struct CombatRng(Mulberry32);

/// Marker component for the player avatar.
#[derive(Component)]
struct PlayerAvatar;

/// Marker component for the chase camera.
#[derive(Component)]
struct FollowCamera;

/// Marker component linking an NPC entity back to the registry.
#[derive(Component)]
struct NpcVisual(NpcId);

/// Tracks spawned caravan entities and the per-kind prototypes they share.
#[derive(Resource)]
struct CaravanVisuals {
    /// Map from caravan handle to spawned entity
    entities: HashMap<CaravanId, Entity>,
    prototypes: HashMap<CaravanKind, (Handle<Mesh>, Handle<StandardMaterial>)>,
}

/// Per-NPC material handles, needed for the interaction highlight.
#[derive(Resource, Default)]
struct NpcVisuals {
    materials: HashMap<NpcId, Handle<StandardMaterial>>,
}

/// Avatar material plus the faction its skin was last built for.
#[derive(Resource)]
struct PlayerVisuals {
    material: Handle<StandardMaterial>,
    skinned_for: Option<Faction>,
}

fn create_image(texture: &TextureData) -> Image {
    Image::new(
        Extent3d {
            width: texture.width as u32,
            height: texture.height as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.pixels.clone(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

/// Build the terrain surface as an indexed triangle mesh with one vertex
/// per height sample.
fn build_terrain_mesh(terrain: &HeightField) -> Mesh {
    let samples = terrain.segments() + 1;
    let half = terrain.half_size();
    let step = terrain.size() / terrain.segments() as f32;

    let mut positions = Vec::with_capacity(samples * samples);
    let mut uvs = Vec::with_capacity(samples * samples);
    for iz in 0..samples {
        for ix in 0..samples {
            let x = -half + ix as f32 * step;
            let z = -half + iz as f32 * step;
            positions.push([x, terrain.sample(ix, iz), z]);
            uvs.push([
                ix as f32 / terrain.segments() as f32,
                iz as f32 / terrain.segments() as f32,
            ]);
        }
    }

    let mut indices = Vec::with_capacity(terrain.segments() * terrain.segments() * 6);
    for iz in 0..terrain.segments() {
        for ix in 0..terrain.segments() {
            let a = (iz * samples + ix) as u32;
            let b = a + 1;
            let d = a + samples as u32;
            let c = d + 1;
            indices.extend_from_slice(&[a, d, b, b, d, c]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh.compute_smooth_normals();
    mesh
}

/// Compose the world ground texture: a neutral steppe base with faction
/// zone palettes stamped around the camps the NPC population uses.
fn compose_ground_texture(terrain: &HeightField) -> TextureData {
    let base = ground_texture(GroundTheme::Neutral);
    let forest = ground_texture(GroundTheme::Forest);
    let imperial = ground_texture(GroundTheme::Imperial);
    let villain = ground_texture(GroundTheme::Villain);

    // Zone centers match the camp layout in the NPC population.
    let zones: [(Vec2, f32, &TextureData); 3] = [
        (Vec2::new(-260.0, 210.0), 140.0, &forest),
        (Vec2::new(220.0, 130.0), 140.0, &imperial),
        (Vec2::new(310.0, -260.0), 130.0, &villain),
    ];

    let size = GROUND_TEXTURE_SIZE;
    let mut pixels = vec![0u8; size * size * 4];
    for py in 0..size {
        let z = (py as f32 / (size - 1) as f32 - 0.5) * terrain.size();
        for px in 0..size {
            let x = (px as f32 / (size - 1) as f32 - 0.5) * terrain.size();
            let world = Vec2::new(x, z);

            let mut source = &base;
            for (center, radius, texture) in &zones {
                if world.distance(*center) < *radius {
                    source = texture;
                    break;
                }
            }

            // Tile the 256px zone texture across the composed canvas.
            let sx = px % source.width;
            let sy = py % source.height;
            let src = (sy * source.width + sx) * 4;
            let dst = (py * size + px) * 4;
            pixels[dst..dst + 4].copy_from_slice(&source.pixels[src..src + 4]);
        }
    }

    TextureData {
        width: size,
        height: size,
        pixels,
    }
}

fn npc_theme(kind: NpcKind) -> EntityTheme {
    match kind {
        NpcKind::Merchant => EntityTheme::Neutral,
        NpcKind::Elf => EntityTheme::Elf,
        NpcKind::Guard => EntityTheme::Guard,
        NpcKind::Villain => EntityTheme::Villain,
    }
}

fn caravan_theme(kind: CaravanKind) -> EntityTheme {
    match kind {
        CaravanKind::Merchant => EntityTheme::MerchantCaravan,
        CaravanKind::ImperialSupply => EntityTheme::ImperialCaravan,
    }
}

fn player_theme(faction: Option<Faction>) -> EntityTheme {
    match faction {
        None => EntityTheme::Neutral,
        Some(Faction::ForestElves) => EntityTheme::Elf,
        Some(Faction::PalaceGuard) => EntityTheme::Guard,
        Some(Faction::Villain) => EntityTheme::Villain,
    }
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    terrain: Res<HeightField>,
    npcs: Res<NpcManager>,
    player: Res<Player>,
) {
    println!(
        "World ready: {}x{} terrain samples, {} NPCs, seed {}.",
        terrain.segments() + 1,
        terrain.segments() + 1,
        npcs.len(),
        WORLD_SEED
    );

    // Terrain surface
    let ground_handle = images.add(create_image(&compose_ground_texture(&terrain)));
    let terrain_mesh = meshes.add(build_terrain_mesh(&terrain));
    let terrain_material = materials.add(StandardMaterial {
        base_color_texture: Some(ground_handle),
        perceptual_roughness: 0.95,
        ..default()
    });
    commands.spawn((Mesh3d(terrain_mesh), MeshMaterial3d(terrain_material)));

    // Lighting
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 250.0,
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(120.0, 220.0, 80.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Player avatar and chase camera
    let player_mesh = meshes.add(Capsule3d::new(0.5, 1.0));
    let player_image = images.add(create_image(&entity_texture(player_theme(player.faction))));
    let player_material = materials.add(StandardMaterial {
        base_color_texture: Some(player_image),
        ..default()
    });
    commands.insert_resource(PlayerVisuals {
        material: player_material.clone(),
        skinned_for: player.faction,
    });
    commands.spawn((
        Mesh3d(player_mesh),
        MeshMaterial3d(player_material),
        Transform::from_translation(player.motion.position),
        PlayerAvatar,
    ));
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(player.motion.position + Vec3::new(0.0, 8.0, 12.0))
            .looking_at(player.motion.position, Vec3::Y),
        FollowCamera,
    ));

    // One capsule and material per NPC; materials are per instance so the
    // interaction highlight can touch a single NPC.
    let npc_mesh = meshes.add(Capsule3d::new(0.45, 0.9));
    let mut npc_visuals = NpcVisuals::default();
    let mut theme_images: HashMap<EntityTheme, Handle<Image>> = HashMap::new();
    for npc in npcs.iter() {
        let theme = npc_theme(npc.kind);
        let image = theme_images
            .entry(theme)
            .or_insert_with(|| images.add(create_image(&entity_texture(theme))))
            .clone();
        let material = materials.add(StandardMaterial {
            base_color_texture: Some(image),
            ..default()
        });
        npc_visuals.materials.insert(npc.id, material.clone());
        commands.spawn((
            Mesh3d(npc_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(npc.motion.position),
            NpcVisual(npc.id),
        ));
    }
    commands.insert_resource(npc_visuals);

    // Caravan prototypes; instances are spawned as the manager emits them
    let caravan_mesh = meshes.add(Cuboid::new(1.0, 1.0, 2.0));
    let mut prototypes = HashMap::new();
    for kind in [CaravanKind::Merchant, CaravanKind::ImperialSupply] {
        let image = images.add(create_image(&entity_texture(caravan_theme(kind))));
        let material = materials.add(StandardMaterial {
            base_color_texture: Some(image),
            ..default()
        });
        prototypes.insert(kind, (caravan_mesh.clone(), material));
    }
    commands.insert_resource(CaravanVisuals {
        entities: HashMap::new(),
        prototypes,
    });
}

fn read_input(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    let mut direction = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        direction.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        direction.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        direction.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        direction.x += 1.0;
    }
    input.direction = direction.normalize_or_zero();
    input.attack = keyboard.just_pressed(KeyCode::Space);
    input.save = keyboard.just_pressed(KeyCode::F5);
    input.load = keyboard.just_pressed(KeyCode::F9);
}

fn apply_player_movement(
    input: Res<PlayerInput>,
    mut player: ResMut<Player>,
    terrain: Res<HeightField>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();
    player.move_by(input.direction, delta, &terrain);
    player.update(delta);
}

fn resolve_attack(
    input: Res<PlayerInput>,
    mut player: ResMut<Player>,
    mut caravans: ResMut<CaravanManager>,
    mut rng: ResMut<CombatRng>,
    mut hud: ResMut<HudState>,
) {
    if !input.attack {
        return;
    }
    let Some(id) = caravans.nearest_in_range(player.motion.position, ATTACK_RANGE) else {
        return;
    };
    player.attack();
    let parts_before = player.body_parts;
    if let Some(loot) = attack_caravan(&mut player, &mut caravans, id, &mut rng.0) {
        let mut message = format!("{} +{} gold", loot.flavor, loot.gold);
        for item in &loot.items {
            message.push_str(&format!(", found {}", item));
        }
        if player.body_parts != parts_before {
            message.push_str(" ... and it cost you a leg.");
        }
        hud.last_loot = Some(message);
    }
}

fn update_interact_highlight(player: Res<Player>, mut npcs: ResMut<NpcManager>) {
    let nearest = npcs
        .get_nearest_interactable(player.motion.position, INTERACT_RANGE)
        .map(|(id, _)| id);
    npcs.set_highlighted(nearest);
}

fn handle_save_load(
    input: Res<PlayerInput>,
    mut player: ResMut<Player>,
    terrain: Res<HeightField>,
    mut hud: ResMut<HudState>,
) {
    if input.save {
        let result = ensure_saves_dir()
            .map_err(Into::into)
            .and_then(|_| save_game(&save_path(), &SaveData::capture(&player)));
        hud.status = match result {
            Ok(()) => "Game saved.".to_string(),
            Err(e) => format!("Save failed: {}", e),
        };
        println!("{}", hud.status);
    }
    if input.load {
        hud.status = match try_load(&save_path()) {
            Some(data) => {
                data.apply(&mut player, &terrain);
                "Game loaded.".to_string()
            }
            None => "No save found.".to_string(),
        };
        println!("{}", hud.status);
    }
}

/// Spawn, move and despawn caravan entities to mirror the manager.
fn sync_caravan_visuals(
    mut commands: Commands,
    caravans: Res<CaravanManager>,
    mut visuals: ResMut<CaravanVisuals>,
    mut transforms: Query<&mut Transform>,
) {
    for caravan in caravans.iter() {
        match visuals.entities.get(&caravan.id) {
            Some(&entity) => {
                if let Ok(mut transform) = transforms.get_mut(entity) {
                    transform.translation = caravan.motion.position;
                    transform.rotation = Quat::from_rotation_y(caravan.motion.heading);
                }
            }
            None => {
                let (mesh, material) = visuals.prototypes[&caravan.kind].clone();
                let entity = commands
                    .spawn((
                        Mesh3d(mesh),
                        MeshMaterial3d(material),
                        Transform::from_translation(caravan.motion.position),
                    ))
                    .id();
                visuals.entities.insert(caravan.id, entity);
            }
        }
    }

    // Despawn entities whose caravan expired or was destroyed
    let mut to_remove = Vec::new();
    for (&id, &entity) in &visuals.entities {
        if caravans.get(id).is_none() {
            commands.entity(entity).despawn();
            to_remove.push(id);
        }
    }
    for id in to_remove {
        visuals.entities.remove(&id);
    }
}

fn sync_npc_visuals(
    npcs: Res<NpcManager>,
    visuals: Res<NpcVisuals>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(&NpcVisual, &mut Transform)>,
) {
    for (visual, mut transform) in &mut query {
        let Some(npc) = npcs.get(visual.0) else { continue };
        transform.translation = npc.motion.position;
        transform.rotation = Quat::from_rotation_y(npc.motion.heading);

        if let Some(material) = visuals
            .materials
            .get(&visual.0)
            .and_then(|handle| materials.get_mut(handle))
        {
            material.emissive = if npcs.highlighted() == Some(visual.0) {
                LinearRgba::new(0.35, 0.3, 0.08, 1.0)
            } else {
                LinearRgba::BLACK
            };
        }
    }
}

/// Rebuild the avatar skin when the player's faction changes.
fn sync_player_skin(
    player: Res<Player>,
    mut visuals: ResMut<PlayerVisuals>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if player.faction == visuals.skinned_for {
        return;
    }
    let image = images.add(create_image(&entity_texture(player_theme(player.faction))));
    if let Some(material) = materials.get_mut(&visuals.material) {
        material.base_color_texture = Some(image);
    }
    visuals.skinned_for = player.faction;
}

fn sync_player_visual(
    player: Res<Player>,
    mut avatar: Query<&mut Transform, (With<PlayerAvatar>, Without<FollowCamera>)>,
    mut camera: Query<&mut Transform, With<FollowCamera>>,
) {
    let Ok(mut transform) = avatar.get_single_mut() else { return };
    transform.translation = player.motion.position;
    transform.rotation = Quat::from_rotation_y(player.motion.heading)
        * Quat::from_rotation_x(-player.attack_swing());

    let Ok(mut camera_transform) = camera.get_single_mut() else { return };
    camera_transform.translation = player.motion.position + Vec3::new(0.0, 8.0, 12.0);
    camera_transform.look_at(player.motion.position, Vec3::Y);
}

fn hud_ui(
    mut contexts: EguiContexts,
    mut player: ResMut<Player>,
    npcs: Res<NpcManager>,
    mut hud: ResMut<HudState>,
) {
    let ctx = contexts.ctx_mut();

    if player.faction.is_none() {
        egui::Window::new("Choose your allegiance")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    for faction in Faction::all() {
                        if ui.button(faction.display_name()).clicked() {
                            player.set_faction(*faction);
                        }
                    }
                });
            });
        return;
    }

    egui::Window::new("Caravan Saga")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            if let Some(faction) = player.faction {
                ui.label(format!("Allegiance: {}", faction.display_name()));
            }
            ui.label(format!("Health: {}", player.health));
            ui.label(format!("Gold: {}", player.gold));
            ui.label(format!("Speed: {:.1}", player.effective_speed()));
            if !player.body_parts.legs_intact() {
                ui.colored_label(egui::Color32::LIGHT_RED, "Injured leg: movement halved");
            }

            if !player.inventory.is_empty() {
                ui.separator();
                ui.label("Cargo:");
                for item in &player.inventory {
                    ui.label(format!("  {}", item));
                }
            }

            if let Some(ref loot) = hud.last_loot {
                ui.separator();
                ui.label(loot.clone());
            }
            if !hud.status.is_empty() {
                ui.separator();
                ui.label(hud.status.clone());
            }

            ui.separator();
            ui.label("WASD move, Space attack, F5 save, F9 load");
        });

    // Trade window when the highlighted NPC offers it
    let trader_window = npcs
        .highlighted()
        .and_then(|id| npcs.get(id))
        .filter(|npc| npc.interaction == Some(Interaction::Trade));
    if let Some(trader) = trader_window {
        let name = trader.display_name.clone();
        egui::Window::new(name)
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                if ui.button("Healing draught (20 gold)").clicked() {
                    if player.spend_gold(20) {
                        player.heal(30);
                        hud.status = "You feel restored.".to_string();
                    } else {
                        hud.status = "Not enough gold.".to_string();
                    }
                }
                if ui.button("Swift boots (45 gold)").clicked() {
                    if player.spend_gold(45) {
                        player.apply_speed_upgrade(0.8);
                        hud.status = "Your stride lengthens.".to_string();
                    } else {
                        hud.status = "Not enough gold.".to_string();
                    }
                }
            });
    }
}
