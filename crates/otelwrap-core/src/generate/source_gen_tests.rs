// Tests for wrapper source generation

use pretty_assertions::assert_eq;

use super::*;
use crate::loader::MemorySource;

fn generate(source: MemorySource, path: &str, names: &[&str], config: &GenerateConfig) -> String {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let mut out = Vec::new();
    load_and_generate(&mut out, source, path, &names, config).unwrap();
    String::from_utf8(out).unwrap()
}

fn context_param(name: &str) -> Tuple {
    Tuple::new(name, "context.Context")
        .with_role(Role::Context)
        .with_reference(PackageReference::new("context", 0, 7))
}

#[test]
fn test_sample_skips_method_without_context() {
    let source = MemorySource::new().with_file(
        "example.com/sample",
        "sample.go",
        "package sample\n\nimport \"context\"\n\ntype Sample interface {\n\tGet(ctx context.Context) (int, error)\n\tCheck() (bool, error)\n}\n",
    );
    let generated = generate(source, "example.com/sample", &["Sample"], &GenerateConfig::default());

    assert_eq!(
        generated,
        r#"package sample

import (
	"context"
	"go.opentelemetry.io/otel/trace"
	"go.opentelemetry.io/otel/codes"
)

// SampleWrapper wraps OpenTelemetry's span
type SampleWrapper struct {
	Sample
	tracer trace.Tracer
	prefix string
}

// NewSampleWrapper creates a wrapper
func NewSampleWrapper(wrapped Sample, tracer trace.Tracer, prefix string) *SampleWrapper {
	return &SampleWrapper{
		Sample: wrapped,
		tracer: tracer,
		prefix: prefix,
	}
}

// Get ...
func (w *SampleWrapper) Get(ctx context.Context) (a int, err error) {
	ctx, span := w.tracer.Start(ctx, w.prefix + "Get")
	defer span.End()

	a, err = w.Sample.Get(ctx)
	if err != nil {
		span.RecordError(err)
		span.SetStatus(codes.Error, err.Error())
	}
	return a, err
}
"#
    );
}

#[test]
fn test_span_variable_avoids_param_named_span() {
    let info = PackageTypeInfo {
        name: "example".to_string(),
        path: "example.com/example".to_string(),
        imports: vec![
            ImportBinding::requested("context", "context"),
            ImportBinding::requested("time", "time"),
        ],
        interfaces: vec![InterfaceModel {
            name: "Handler".to_string(),
            type_params: None,
            methods: vec![
                Method {
                    name: "Hello".to_string(),
                    params: vec![
                        context_param("ctx"),
                        Tuple::new("n", "int"),
                        Tuple::new("createdAt", "time.Time").with_reference(PackageReference::new("time", 0, 4)),
                    ],
                    results: vec![Tuple::new("", "error").with_role(Role::Error)],
                },
                Method {
                    name: "WithReturn".to_string(),
                    params: vec![context_param("rootCtx"), Tuple::new("n", "int"), Tuple::new("span", "string")],
                    results: vec![
                        Tuple::new("count", "int64"),
                        Tuple::new("err", "error").with_role(Role::Error),
                    ],
                },
            ],
        }],
    };

    let mut out = Vec::new();
    generate_code(&mut out, &info, &GenerateConfig::default()).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        r#"package example

import (
	"context"
	"time"
	"go.opentelemetry.io/otel/trace"
	"go.opentelemetry.io/otel/codes"
)

// HandlerWrapper wraps OpenTelemetry's span
type HandlerWrapper struct {
	Handler
	tracer trace.Tracer
	prefix string
}

// NewHandlerWrapper creates a wrapper
func NewHandlerWrapper(wrapped Handler, tracer trace.Tracer, prefix string) *HandlerWrapper {
	return &HandlerWrapper{
		Handler: wrapped,
		tracer: tracer,
		prefix: prefix,
	}
}

// Hello ...
func (w *HandlerWrapper) Hello(ctx context.Context, n int, createdAt time.Time) (err error) {
	ctx, span := w.tracer.Start(ctx, w.prefix + "Hello")
	defer span.End()

	err = w.Handler.Hello(ctx, n, createdAt)
	if err != nil {
		span.RecordError(err)
		span.SetStatus(codes.Error, err.Error())
	}
	return err
}

// WithReturn ...
func (w *HandlerWrapper) WithReturn(rootCtx context.Context, n int, span string) (count int64, err error) {
	rootCtx, span1 := w.tracer.Start(rootCtx, w.prefix + "WithReturn")
	defer span1.End()

	count, err = w.Handler.WithReturn(rootCtx, n, span)
	if err != nil {
		span1.RecordError(err)
		span1.SetStatus(codes.Error, err.Error())
	}
	return count, err
}
"#
    );
}

#[test]
fn test_methods_without_results_or_errors() {
    let source = MemorySource::new().with_file(
        "example.com/timer",
        "timer.go",
        r#"package timer

import (
	"context"
	"time"
)

type Timer interface {
	Start(ctx context.Context, d time.Duration)
	Elapsed(context.Context) time.Duration
}
"#,
    );
    let generated = generate(source, "example.com/timer", &["Timer"], &GenerateConfig::default());

    assert!(!generated.contains("otel/codes"));
    assert!(generated.contains(
        "func (w *TimerWrapper) Start(ctx context.Context, d time.Duration) {\n\tctx, span := w.tracer.Start(ctx, w.prefix + \"Start\")\n\tdefer span.End()\n\n\tw.Timer.Start(ctx, d)\n}\n"
    ));
    assert!(generated.contains(
        "func (w *TimerWrapper) Elapsed(ctx context.Context) (a time.Duration) {\n\tctx, span := w.tracer.Start(ctx, w.prefix + \"Elapsed\")\n\tdefer span.End()\n\n\ta = w.Timer.Elapsed(ctx)\n\treturn a\n}\n"
    ));
}

#[test]
fn test_wrapper_in_another_package() {
    let source = MemorySource::new().with_file(
        "example.com/hello",
        "hello.go",
        r#"package hello

import "context"

type User struct{}

type Simple interface {
	Handle(ctx context.Context, u *User) error
	Variadic(ctx context.Context, names ...string)
}
"#,
    );
    let config = GenerateConfig::in_another_package(Some("wrapped".to_string()));
    let generated = generate(source, "example.com/hello", &["Simple"], &config);

    assert!(generated.starts_with(
        "package wrapped\n\nimport (\n\t\"example.com/hello\"\n\t\"context\"\n\t\"go.opentelemetry.io/otel/trace\"\n\t\"go.opentelemetry.io/otel/codes\"\n)\n"
    ));
    assert!(generated.contains("type SimpleWrapper struct {\n\thello.Simple\n"));
    assert!(generated.contains("func NewSimpleWrapper(wrapped hello.Simple, tracer trace.Tracer, prefix string) *SimpleWrapper {"));
    assert!(generated.contains("\t\tSimple: wrapped,\n"));
    assert!(generated.contains("func (w *SimpleWrapper) Handle(ctx context.Context, u *hello.User) (err error) {"));
    assert!(generated.contains("func (w *SimpleWrapper) Variadic(ctx context.Context, names ...string) {"));
    assert!(generated.contains("\tw.Simple.Variadic(ctx, names...)\n"));
}

#[test]
fn test_generic_interface() {
    let source = MemorySource::new().with_file(
        "example.com/repo",
        "repo.go",
        r#"package repo

import "context"

type Repo[K comparable, V any] interface {
	Find(ctx context.Context, key K) (V, error)
	Keys(ctx context.Context) []K
}
"#,
    );
    let generated = generate(source, "example.com/repo", &["Repo"], &GenerateConfig::default());

    assert!(generated.contains("type RepoWrapper[K comparable, V any] struct {\n\tRepo[K, V]\n"));
    assert!(generated.contains(
        "func NewRepoWrapper[K comparable, V any](wrapped Repo[K, V], tracer trace.Tracer, prefix string) *RepoWrapper[K, V] {\n\treturn &RepoWrapper[K, V]{\n\t\tRepo: wrapped,\n"
    ));
    assert!(generated.contains("func (w *RepoWrapper[K, V]) Find(ctx context.Context, key K) (a V, err error) {"));
    assert!(generated.contains("func (w *RepoWrapper[K, V]) Keys(ctx context.Context) (a []K) {"));
}

#[test]
fn test_otel_imports_disambiguated() {
    let source = MemorySource::new()
        .with_file(
            "example.com/me/svc",
            "svc.go",
            r#"package svc

import (
	"context"
	"example.com/me/trace"
)

type Service interface {
	Run(ctx context.Context, id trace.ID) error
}
"#,
        )
        .with_file("example.com/me/trace", "trace.go", "package trace\n\ntype ID string\n");
    let generated = generate(source, "example.com/me/svc", &["Service"], &GenerateConfig::default());

    assert!(generated.contains(
        "import (\n\t\"context\"\n\t\"example.com/me/trace\"\n\toteltrace \"go.opentelemetry.io/otel/trace\"\n\t\"go.opentelemetry.io/otel/codes\"\n)\n"
    ));
    assert!(generated.contains("\ttracer oteltrace.Tracer\n"));
    assert!(generated.contains("Run(ctx context.Context, id trace.ID) (err error)"));
}

#[test]
fn test_multiple_interfaces_in_request_order() {
    let source = MemorySource::new().with_file(
        "example.com/multi",
        "multi.go",
        "package multi\n\nimport \"context\"\n\ntype A interface {\n\tDo(ctx context.Context)\n}\n\ntype B interface {\n\tDo(ctx context.Context)\n}\n",
    );
    let generated = generate(source, "example.com/multi", &["B", "A"], &GenerateConfig::default());

    let b = generated.find("type BWrapper struct").unwrap();
    let a = generated.find("type AWrapper struct").unwrap();
    assert!(b < a);
    assert!(generated.ends_with("\tw.A.Do(ctx)\n}\n"));
}

#[test]
fn test_generated_names_avoid_result_names() {
    let source = MemorySource::new().with_file(
        "example.com/sample",
        "sample.go",
        r#"package sample

import "context"

type Sample interface {
	WithSpan(ctx context.Context) (span int, err error)
	WithLetter(context.Context, int) (a string, err error)
	WithCtx(context.Context) (ctx int, err error)
}
"#,
    );
    let generated = generate(source, "example.com/sample", &["Sample"], &GenerateConfig::default());

    assert!(generated.contains(
        r#"func (w *SampleWrapper) WithSpan(ctx context.Context) (span int, err error) {
	ctx, span1 := w.tracer.Start(ctx, w.prefix + "WithSpan")
	defer span1.End()

	span, err = w.Sample.WithSpan(ctx)
	if err != nil {
		span1.RecordError(err)
		span1.SetStatus(codes.Error, err.Error())
	}
	return span, err
}
"#
    ));
    assert!(generated.contains(
        "func (w *SampleWrapper) WithLetter(ctx context.Context, a1 int) (a string, err error) {\n"
    ));
    assert!(generated.contains("\ta, err = w.Sample.WithLetter(ctx, a1)\n"));
    assert!(generated.contains(
        "func (w *SampleWrapper) WithCtx(ctx1 context.Context) (ctx int, err error) {\n\tctx1, span := w.tracer.Start(ctx1, w.prefix + \"WithCtx\")\n"
    ));
    assert!(generated.contains("\tctx, err = w.Sample.WithCtx(ctx1)\n"));
}

#[test]
fn test_context_alias_is_wrapped() {
    let source = MemorySource::new().with_file(
        "example.com/sample",
        "sample.go",
        "package sample\n\nimport \"context\"\n\ntype Ctx = context.Context\n\ntype Sample interface {\n\tRun(Ctx) error\n}\n",
    );
    let generated = generate(source, "example.com/sample", &["Sample"], &GenerateConfig::default());

    assert!(generated.contains("func (w *SampleWrapper) Run(ctx Ctx) (err error) {\n"));
    assert!(generated.contains("\terr = w.Sample.Run(ctx)\n"));
}
