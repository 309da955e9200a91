#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use terrain_graph::map::Dimensions;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub const SIDES: [usize; 3] = [64, 256, 513];

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn cells_throughput(dimensions: Dimensions) -> Throughput {
    Throughput::Elements(dimensions.area().max(1) as u64)
}
