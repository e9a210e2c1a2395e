//! Prometheus metrics for the blockchain module.

pub fn update_head_slot(slot: u64) {
    static HEAD_SLOT: std::sync::LazyLock<prometheus::IntGauge> = std::sync::LazyLock::new(|| {
        prometheus::register_int_gauge!("ethlean_head_slot", "Latest slot of the lean chain")
            .unwrap()
    });
    HEAD_SLOT.set(slot.try_into().unwrap());
}

pub fn update_latest_justified_slot(slot: u64) {
    static LATEST_JUSTIFIED_SLOT: std::sync::LazyLock<prometheus::IntGauge> =
        std::sync::LazyLock::new(|| {
            prometheus::register_int_gauge!("ethlean_latest_justified_slot", "Latest justified slot")
                .unwrap()
        });
    LATEST_JUSTIFIED_SLOT.set(slot.try_into().unwrap());
}

pub fn update_latest_finalized_slot(slot: u64) {
    static LATEST_FINALIZED_SLOT: std::sync::LazyLock<prometheus::IntGauge> =
        std::sync::LazyLock::new(|| {
            prometheus::register_int_gauge!("ethlean_latest_finalized_slot", "Latest finalized slot")
                .unwrap()
        });
    LATEST_FINALIZED_SLOT.set(slot.try_into().unwrap());
}

pub fn update_current_slot(slot: u64) {
    static CURRENT_SLOT: std::sync::LazyLock<prometheus::IntGauge> =
        std::sync::LazyLock::new(|| {
            prometheus::register_int_gauge!(
                "ethlean_current_slot",
                "Current slot of the lean chain"
            )
            .unwrap()
        });
    CURRENT_SLOT.set(slot.try_into().unwrap());
}

pub fn update_safe_target_slot(slot: u64) {
    static SAFE_TARGET_SLOT: std::sync::LazyLock<prometheus::IntGauge> =
        std::sync::LazyLock::new(|| {
            prometheus::register_int_gauge!("ethlean_safe_target_slot", "Safe target slot").unwrap()
        });
    SAFE_TARGET_SLOT.set(slot.try_into().unwrap());
}
