const UNITS: [&str; 5] = ["B/s", "KB/s", "MB/s", "GB/s", "TB/s"];

pub struct Speed {
    pub bytes_per_second: u64,
    pub unit: &'static str,
}

pub fn get_speed(current_bytes: u64, previous_bytes: u64, elapsed_millis: u128) -> Speed {
    if elapsed_millis == 0 {
        return Speed {
            bytes_per_second: 0,
            unit: UNITS[0],
        };
    }

    let mut speed = current_bytes.saturating_sub(previous_bytes) as u128 * 1_000 / elapsed_millis;
    let mut unit = 0;
    while speed >= 1_024 && unit < UNITS.len() - 1 {
        speed /= 1_024;
        unit += 1;
    }

    Speed {
        bytes_per_second: speed as u64,
        unit: UNITS[unit],
    }
}
