use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use engine::{Engine, EngineConfig, NoInput, PlatformDispatcher, TracingReporter, WaypointSequence};
use rand::{rngs::StdRng, SeedableRng};
use routing::{dwell_points, CsvRouteSource};
use shared::{
    domain::{Coordinate, PlatformTarget},
    error::DispatchError,
};

#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<(PlatformTarget, Coordinate)>>,
}

#[async_trait]
impl PlatformDispatcher for RecordingDispatcher {
    async fn set_location(
        &self,
        target: &PlatformTarget,
        coordinate: Coordinate,
    ) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .expect("calls")
            .push((target.clone(), coordinate));
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn csv_route_with_dwell_tail_is_walked_in_file_order() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "latitude,longitude").expect("write");
    writeln!(file, "51.5007,-0.1246").expect("write");
    writeln!(file, "not,a,row").expect("write");
    writeln!(file, "51.5010,-0.1240").expect("write");
    writeln!(file, "51.5014,-0.1235").expect("write");

    let loaded = WaypointSequence::load(&CsvRouteSource::new(file.path()))
        .await
        .expect("sequence");
    assert_eq!(loaded.len(), 3);

    let mut rng = StdRng::seed_from_u64(11);
    let mut waypoints = loaded.as_slice().to_vec();
    waypoints.extend(dwell_points(loaded.last(), 4, 0.002, 0.004, &mut rng));
    let sequence = WaypointSequence::new(waypoints.clone()).expect("sequence with dwell");

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let engine = Engine::new(
        EngineConfig::default(),
        dispatcher.clone(),
        Arc::new(TracingReporter),
    )
    .expect("engine");
    let target = PlatformTarget::android(Some("emulator-5554".into()));

    let outcome = engine.run(sequence, 0.1, target.clone(), NoInput).await;

    assert!(outcome.is_completed(), "{outcome:?}");
    let calls = dispatcher.calls.lock().expect("calls").clone();
    assert_eq!(calls.len(), 7);
    assert!(calls.iter().all(|(t, _)| *t == target));
    let dispatched: Vec<Coordinate> = calls.into_iter().map(|(_, c)| c).collect();
    assert_eq!(dispatched, waypoints);
}
