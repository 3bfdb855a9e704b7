use criterion::{Criterion, criterion_group, criterion_main};
use chrono::NaiveDate;
use domain::{EnrollmentRecord, RawSubmission, validate};
use std::hint::black_box;

fn bench_validate_valid(c: &mut Criterion) {
    let raw = RawSubmission::new("Asha", 30, "6-7AM", "9876543210");

    c.bench_function("domain/validate_valid", |b| {
        b.iter(|| validate(black_box(&raw)).unwrap());
    });
}

fn bench_validate_all_fields_invalid(c: &mut Criterion) {
    let raw = RawSubmission::new("  ", "old", "noon", "12345");

    c.bench_function("domain/validate_all_invalid", |b| {
        b.iter(|| validate(black_box(&raw)).unwrap_err());
    });
}

fn bench_deserialize_and_validate(c: &mut Criterion) {
    let body = r#"{"name":"Asha","age":30,"selectedBatch":"6-7AM","phoneNumber":"9876543210"}"#;

    c.bench_function("domain/deserialize_and_validate", |b| {
        b.iter(|| {
            let raw: RawSubmission = serde_json::from_str(black_box(body)).unwrap();
            validate(&raw).unwrap()
        });
    });
}

fn bench_month_check_long_history(c: &mut Criterion) {
    let raw = RawSubmission::new("Asha", 30, "6-7AM", "9876543210");
    let first = NaiveDate::from_ymd_opt(2015, 1, 5).unwrap();
    let mut record = EnrollmentRecord::new(validate(&raw).unwrap(), first);
    for months in 1..120 {
        let date = first.checked_add_months(chrono::Months::new(months)).unwrap();
        record.record_enrollment(date).unwrap();
    }
    let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

    c.bench_function("domain/month_check_120_dates", |b| {
        b.iter(|| black_box(&record).ensure_can_enroll_on(black_box(today)));
    });
}

criterion_group!(
    benches,
    bench_validate_valid,
    bench_validate_all_fields_invalid,
    bench_deserialize_and_validate,
    bench_month_check_long_history
);
criterion_main!(benches);
