//! Drives a manager on a tokio runtime with a burst of resizes.
//!
//! Run with `RUST_LOG=debug` to see the debounce and change detection at work.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use responsive_viewport::prelude::*;

#[derive(Debug)]
struct Sprite {
    name: &'static str,
    position: Point,
    scale: f64,
}

impl Sprite {
    fn shared(name: &'static str, x: f64, y: f64, scale: f64) -> Arc<Mutex<Sprite>> {
        Arc::new(Mutex::new(Sprite { name, position: Point::new(x, y), scale }))
    }
}

impl Transformable for Sprite {
    fn position(&self) -> Point {
        self.position
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_position(&mut self, x: f64, y: f64) -> Result<(), TransformError> {
        self.position = Point::new(x, y);
        Ok(())
    }

    fn set_scale(&mut self, factor: f64) -> Result<(), TransformError> {
        self.scale = factor;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ResponsiveConfig::builder().base_resolution(800.0, 600.0).build()?;
    let manager = ResponsiveManager::new(config, Arc::new(TokioScheduler::current()?))?;

    let background = Sprite::shared("background", 400.0, 300.0, 1.0);
    let enemy = Sprite::shared("enemy", 100.0, 200.0, 2.0);
    let hud_text = Sprite::shared("hudText", 20.0, 20.0, 1.0);

    manager.register_element(Some("background".into()), Arc::<Mutex<Sprite>>::downgrade(&background), ElementKind::Background, RegisterOptions::default())?;
    manager.register_element(
        Some("enemy".into()),
        Arc::<Mutex<Sprite>>::downgrade(&enemy),
        ElementKind::GameObject,
        RegisterOptions::default().with_constraints(Constraints::max(1.5)),
    )?;
    manager.register_element(Some("hudText".into()), Arc::<Mutex<Sprite>>::downgrade(&hud_text), ElementKind::Text, RegisterOptions::default())?;

    // a window being dragged wider
    for w in (1000..=1600).step_by(50) {
        manager.on_resize(Size::new(w as f64, 900.0));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(manager.config().debounce() + Duration::from_millis(50)).await;

    // browser chrome hiding: below the change threshold
    manager.on_resize(Size::new(1600.0, 904.0));
    tokio::time::sleep(manager.config().debounce() + Duration::from_millis(50)).await;

    for sprite in [&background, &enemy, &hud_text] {
        let s = sprite.lock().map_err(|_| anyhow::anyhow!("sprite lock poisoned"))?;
        println!("{:<10} at ({:>6.1}, {:>6.1}) scale {:.2}", s.name, s.position.x, s.position.y, s.scale);
    }

    println!("viewport: {}", serde_json::to_string(&manager.viewport())?);
    println!("stats:    {}", serde_json::to_string(&manager.performance_stats())?);

    manager.destroy();
    Ok(())
}
