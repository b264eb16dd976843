use geocluster::{ClusterOptions, Photo, PhotoClusterer, Viewport};
use rand::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=geocluster=debug shows index builds and viewport changes.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // A trip: bursts of photos around a few cities, plus some scans without GPS.
    let cities = [
        ("lisbon", 38.72, -9.14),
        ("porto", 41.15, -8.61),
        ("madrid", 40.42, -3.70),
        ("reykjavik", 64.15, -21.94),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let mut photos = Vec::new();
    for (name, lat, lng) in cities {
        for i in 0..rng.random_range(5..40) {
            let jitter_lat = rng.random_range(-0.05..0.05);
            let jitter_lng = rng.random_range(-0.05..0.05);
            photos.push(
                Photo::new(format!("{name}-{i}"), lat + jitter_lat, lng + jitter_lng)
                    .with_url(format!("/photos/{name}/{i}.jpg")),
            );
        }
    }
    for i in 0..5 {
        photos.push(Photo::untagged(format!("scan-{i}")));
    }

    let options = ClusterOptions::from_toml_str("radius = 60.0\nmax_zoom = 15")?;
    let mut map = PhotoClusterer::with_options(options, 2.0)?;
    map.set_photos(photos);
    println!("{} photos with a usable geotag", map.valid_photos().len());

    for zoom in [2.0, 5.0, 8.0, 11.0] {
        map.on_viewport_change(Viewport::new(zoom, 40.0, -8.0));
        println!(
            "zoom {zoom:>4}: {} clusters, {} single photos",
            map.clusters().len(),
            map.single_photos().len()
        );
        for cluster in map.clusters() {
            println!(
                "  cluster {} at ({:.3}, {:.3}): {} photos, expands at zoom {}",
                cluster.id, cluster.latitude, cluster.longitude, cluster.count, cluster.expansion_zoom
            );
        }
    }

    Ok(())
}
