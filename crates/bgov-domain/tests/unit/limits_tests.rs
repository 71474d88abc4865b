//! Fair-share computation

use bgov_domain::{ResourceLimits, SystemPolicy};

const HOST_MB: u64 = 8192;

#[test]
fn single_user_gets_whole_pool() {
    let policy = SystemPolicy::default();
    let limits = ResourceLimits::fair_share(&policy, HOST_MB, 1);

    assert!((limits.max_cpu_percent - 75.0).abs() < f64::EPSILON);
    assert_eq!(limits.max_memory_mb, HOST_MB - 256);
}

#[test]
fn zero_users_treated_as_one() {
    let policy = SystemPolicy::default();
    assert_eq!(
        ResourceLimits::fair_share(&policy, HOST_MB, 0),
        ResourceLimits::fair_share(&policy, HOST_MB, 1)
    );
}

#[test]
fn cpu_shares_never_exceed_pool() {
    let policy = SystemPolicy::default();
    for users in 1..=policy.max_concurrent_users {
        let limits = ResourceLimits::fair_share(&policy, HOST_MB, users);
        let total = limits.max_cpu_percent * users as f64;
        assert!(
            total <= policy.available_cpu_percent(),
            "{users} users share {total}%"
        );
        assert!(limits.max_cpu_percent >= policy.min_cpu_percent);
    }
}

#[test]
fn floors_apply_when_pool_is_thin() {
    let policy = SystemPolicy {
        reserved_cpu_percent: 90.0,
        ..SystemPolicy::default()
    };
    // 10% over 50 users is 0.2% each, lifted to the 1% floor
    let limits = ResourceLimits::fair_share(&policy, 0, 50);
    assert!((limits.max_cpu_percent - policy.min_cpu_percent).abs() < f64::EPSILON);
    // 512 - 256 = 256MB over 50 users is 5MB each, lifted to 32MB
    assert_eq!(limits.max_memory_mb, policy.min_memory_mb);
}

#[test]
fn small_host_uses_minimum_system_ram() {
    let policy = SystemPolicy::default();
    assert_eq!(policy.available_memory_mb(128), 512 - 256);
    assert_eq!(policy.available_memory_mb(HOST_MB), HOST_MB - 256);
}

#[test]
fn static_limits_follow_policy() {
    let policy = SystemPolicy::default();
    let limits = ResourceLimits::fair_share(&policy, HOST_MB, 3);
    assert_eq!(limits.max_workers, 20);
    assert_eq!(limits.max_execution_time.as_secs(), 86_400);
    assert_eq!(limits.max_file_size_bytes, 1024 * 1024);
    assert_eq!(limits.max_total_files, 100);
}

#[test]
fn cpu_shares_summed_one_by_one_stay_within_pool() {
    let policy = SystemPolicy::default();
    for users in [17, 26, 28, 31, 35, 42, 43, 46] {
        let limits = ResourceLimits::fair_share(&policy, HOST_MB, users);
        let total: f64 = std::iter::repeat_n(limits.max_cpu_percent, users).sum();
        assert!(total <= 75.0, "{users} users sum to {total}");
    }
}

#[test]
fn ram_floor_may_overcommit_pool() {
    let policy = SystemPolicy::default();
    let limits = ResourceLimits::fair_share(&policy, 0, 50);
    let pool = policy.available_memory_mb(0);
    assert_eq!(limits.max_memory_mb, policy.min_memory_mb);
    assert!(limits.max_memory_mb * 50 > pool);
}
