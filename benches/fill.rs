//! Fill benchmarks
//!
//! Measures the cost of one quick fix: scanning the declarations, locating
//! the call and synthesizing nested arguments.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fillclass_lsp::config::FillConfig;
use fillclass_lsp::kotlin::{DeclarationIndex, declarations};
use fillclass_lsp::quickfix::{FillRequest, fill_at};
use fillclass_lsp::types::ValueMode;

const MODEL: &str = r#"
package com.example.model

enum class Role { ADMIN, EDITOR, VIEWER }

data class Address(
    val street: String,
    val city: String,
    val zip: String,
    val country: String,
)

data class Company(val name: String, val address: Address, val employees: List<Person>)

data class Person(
    val name: String,
    val email: String,
    val age: Int,
    val role: Role,
    val address: Address,
    val manager: Person?,
    val onChange: (Person, Role) -> Unit,
)
"#;

const CALLER: &str = r#"
package app

import com.example.model.Company
import com.example.model.Person

fun main() {
    val person = Person()
}
"#;

fn index() -> DeclarationIndex {
    let mut index = DeclarationIndex::new();
    index.update("file:///model.kt", MODEL);
    index.update("file:///main.kt", CALLER);
    index
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(MODEL.len() as u64));
    group.bench_function("declarations", |b| {
        b.iter(|| declarations::scan(black_box(MODEL)))
    });
    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    let index = index();
    let offset = CALLER.find("Person()").unwrap_or_default() + 1;
    let mut group = c.benchmark_group("fill");

    for mode in [ValueMode::EmptyDefaults, ValueMode::DummyValues] {
        for chopped in [false, true] {
            let config = FillConfig {
                put_arguments_on_separate_lines: chopped,
                with_trailing_comma: chopped,
                dummy_seed: Some(42),
                ..FillConfig::default()
            };
            let request = FillRequest {
                offset,
                mode,
                choice: None,
                expected_label: None,
                interactive: true,
            };
            let id = format!("{:?}/{}", mode, if chopped { "chopped" } else { "inline" });
            group.bench_with_input(BenchmarkId::from_parameter(id), &request, |b, request| {
                b.iter(|| fill_at(&index, black_box(CALLER), &config, request))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_scan, bench_fill);
criterion_main!(benches);
