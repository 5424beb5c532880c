//! End-to-end playback over the software backend: load from memory, drive
//! the player with a synthetic presentation clock, and check composite and
//! viewport pixels.

use lava_core::PixelSurface;
use lava_player::{MemoryFetcher, Player, PlayerState, RenderBackend, SoftwareBackend, Viewport};

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelSurface {
    let mut s = PixelSurface::new(width, height);
    s.fill(rgba);
    s
}

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const YELLOW: [u8; 4] = [255, 255, 0, 255];

/// The two-image scenario manifest: a 32x32 canvas of 16px tiles, a red key
/// atlas, and a second atlas whose top-left tile is green (rest yellow, so a
/// whole-image copy would be visible as yellow bleed).
fn scenario_fetcher() -> MemoryFetcher {
    let manifest = r##"{
        "version": 1,
        "fps": 10,
        "cellSize": 16,
        "diffImageSize": 512,
        "width": 32,
        "height": 32,
        "density": 1,
        "alpha": true,
        "images": [{"url": "a.png"}, {"url": "b.png"}],
        "frames": [
            {"type": "key", "imageIndex": 0},
            {"type": "diff", "diffs": [[1, 0, 1, 1, 0]]}
        ]
    }"##;

    let mut b = solid(32, 32, YELLOW);
    for y in 0..16 {
        for x in 0..16 {
            b.set_pixel(x, y, GREEN);
        }
    }

    MemoryFetcher::new(manifest.as_bytes().to_vec())
        .with_image("a.png", solid(32, 32, RED))
        .with_image("b.png", b)
}

fn composite_pixels(player: &Player<SoftwareBackend>) -> PixelSurface {
    let surface = player.composite_surface().expect("asset loaded");
    player
        .backend()
        .surface(surface)
        .expect("composite exists")
        .clone()
}

#[test]
fn test_first_tick_renders_frame_zero() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    assert_eq!(player.state(), PlayerState::Ready);

    // Frame 0 is not applied until the first tick.
    let before = composite_pixels(&player);
    assert_eq!(before.get_pixel(0, 0), Some([0, 0, 0, 0]));

    player.play();
    player.advance(0.0);
    assert_eq!(player.frame_index(), 0);
    let after = composite_pixels(&player);
    assert_eq!(after.get_pixel(0, 0), Some(RED));
    assert_eq!(after.get_pixel(31, 31), Some(RED));
}

#[test]
fn test_diff_frame_patches_one_tile() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    player.play();
    player.advance(0.0);
    player.advance(100.0);
    assert_eq!(player.frame_index(), 1);

    let pixels = composite_pixels(&player);
    // The patched top-left tile holds image B's top-left tile.
    assert_eq!(pixels.get_pixel(0, 0), Some(GREEN));
    assert_eq!(pixels.get_pixel(15, 15), Some(GREEN));
    // Every other pixel still holds the key frame's content.
    for (x, y) in [(16, 0), (31, 0), (0, 16), (15, 31), (31, 31), (16, 16)] {
        assert_eq!(pixels.get_pixel(x, y), Some(RED), "at ({}, {})", x, y);
    }
}

#[test]
fn test_ticks_below_frame_duration_do_not_advance() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    player.play();
    player.advance(0.0);
    // 10fps means 100ms per frame; a 60ms tick holds.
    player.advance(60.0);
    assert_eq!(player.frame_index(), 0);
    player.advance(100.0);
    assert_eq!(player.frame_index(), 1);
}

#[test]
fn test_playback_wraps_to_key_frame() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    player.play();
    player.advance(0.0);
    player.advance(100.0);
    player.advance(200.0);
    // Wrapped back to the key frame; the diff's tile is overwritten.
    assert_eq!(player.frame_index(), 0);
    let pixels = composite_pixels(&player);
    assert_eq!(pixels.get_pixel(0, 0), Some(RED));
}

#[test]
fn test_presents_letterboxed_into_viewport() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();

    // 64x32 view around a square canvas: content occupies the middle half.
    let view = player.backend_mut().create_surface(64, 32).unwrap();
    player.attach_viewport(Viewport {
        surface: view,
        width: 64,
        height: 32,
    });

    player.play();
    player.advance(0.0);

    let pixels = player.backend().surface(view).unwrap().clone();
    assert_eq!(pixels.get_pixel(0, 15), Some([0, 0, 0, 0]));
    assert_eq!(pixels.get_pixel(32, 15), Some(RED));
    assert_eq!(pixels.get_pixel(63, 15), Some([0, 0, 0, 0]));
}

#[test]
fn test_present_happens_even_on_hold_ticks() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    player.play();
    player.advance(0.0);

    // Attach the viewport after the first tick; the next tick holds (no
    // frame advance) but must still paint the view.
    let view = player.backend_mut().create_surface(32, 32).unwrap();
    player.attach_viewport(Viewport {
        surface: view,
        width: 32,
        height: 32,
    });
    player.advance(10.0);
    assert_eq!(player.frame_index(), 0);
    let pixels = player.backend().surface(view).unwrap().clone();
    assert_eq!(pixels.get_pixel(16, 16), Some(RED));
}

#[test]
fn test_advance_count_tracks_real_time() {
    let mut player = Player::new(SoftwareBackend::new());
    player.load(&scenario_fetcher(), "mem").unwrap();
    player.play();

    // A 60Hz host clock driving the 10fps animation for 20 simulated
    // seconds. With a 2-frame animation the index toggles on every step.
    let tick_interval = 1000.0 / 60.0;
    let total_ticks = 1200;
    let mut steps = 0u32;
    let mut last_index = player.frame_index();
    for i in 0..=total_ticks {
        player.advance(i as f64 * tick_interval);
        if player.frame_index() != last_index {
            steps += 1;
            last_index = player.frame_index();
        }
    }

    let elapsed = total_ticks as f64 * tick_interval;
    let expected = (elapsed / 100.0).floor() as i64;
    assert!(
        (steps as i64 - expected).abs() <= 1,
        "advanced {} frames over {}ms, expected about {}",
        steps,
        elapsed,
        expected
    );
}
