//! End-to-end tests for the build lifecycle over the real filesystem.
//!
//! These cover:
//! - Load-time optimization and naming
//! - Pass-through when optimization is disabled
//! - Emission, idempotent rewrites and `emit_files = false`
//! - Tree preservation and extra-directory scanning
//! - Per-asset failure isolation

mod helpers;

use fob_imagemin::{ImageminError, ImageminOptions, PreserveTree, Stage, module_source};
use futures::future::join_all;
use helpers::*;
use std::fs;

#[tokio::test]
async fn gif_is_optimized_named_and_emitted() {
    let project = Project::new();
    let source = project.file("fixtures/gif.gif", &bloated_gif());
    let raw = fs::read(&source).unwrap();

    let (imagemin, reporter) = project.imagemin(ImageminOptions::new().with_hash_length(10));
    imagemin.build_start();

    let code = imagemin
        .load(source.to_str().unwrap())
        .await
        .unwrap()
        .expect("gif is included by default");

    let entries = imagemin.table().entries();
    assert_eq!(entries.len(), 1);
    let (output_path, bytes) = &entries[0];
    assert_hashed_name(output_path, "gif", ".gif", 10);
    assert_eq!(code, module_source(output_path));
    assert!(bytes.len() < raw.len());

    let report = imagemin.write_bundle(project.out_dir()).await;
    assert!(report.is_success());

    let written = fs::read(project.out_dir().join(output_path)).unwrap();
    assert_eq!(written, bytes.to_vec());
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn disable_emits_original_bytes() {
    let project = Project::new();
    let source = project.file("fixtures/gif.gif", &bloated_gif());
    let raw = fs::read(&source).unwrap();

    let (imagemin, _) = project.imagemin(
        ImageminOptions::new()
            .with_disable(true)
            .with_hash_length(10),
    );
    imagemin.load(source.to_str().unwrap()).await.unwrap();
    imagemin.write_bundle(project.out_dir()).await;

    let (output_path, _) = imagemin.table().entries().remove(0);
    assert_hashed_name(&output_path, "gif", ".gif", 10);
    assert_eq!(fs::read(project.out_dir().join(&output_path)).unwrap(), raw);
}

#[tokio::test]
async fn every_builtin_codec_shrinks_its_format() {
    let project = Project::new();
    let inputs = [
        project.file("img/photo.jpg", &heavy_jpeg()),
        project.file("img/gradient.png", &loose_png()),
        project.file("img/anim.gif", &bloated_gif()),
        project.file("img/logo.svg", &verbose_svg()),
    ];

    let (imagemin, reporter) = project.imagemin(ImageminOptions::new());
    for input in &inputs {
        let asset = imagemin.process(input).await.unwrap();
        assert!(
            asset.final_size < asset.raw_size,
            "{} did not shrink ({} -> {})",
            input.display(),
            asset.raw_size,
            asset.final_size
        );
        assert!(asset.comparison().to_string().ends_with("% smaller"));
    }

    assert_eq!(imagemin.table().len(), 4);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn emit_files_false_writes_nothing() {
    let project = Project::new();
    let source = project.file("a.png", &loose_png());

    let (imagemin, _) = project.imagemin(ImageminOptions::new().with_emit_files(false));
    assert!(imagemin.load(source.to_str().unwrap()).await.unwrap().is_some());

    let report = imagemin.write_bundle(project.out_dir()).await;
    assert!(report.skipped);
    assert!(!project.out_dir().exists());
    assert_eq!(imagemin.table().len(), 1);
}

#[tokio::test]
async fn repeated_writes_produce_identical_output() {
    let project = Project::new();
    let source = project.file("logo.svg", &verbose_svg());

    let (imagemin, _) = project.imagemin(ImageminOptions::new().with_public_path("static"));
    imagemin.load(source.to_str().unwrap()).await.unwrap();

    let first = imagemin.write_bundle(project.out_dir()).await;
    let before = fs::read(&first.written[0]).unwrap();
    let second = imagemin.write_bundle(project.out_dir()).await;

    assert_eq!(first.written, second.written);
    assert!(first.written[0].starts_with(project.out_dir().join("static")));
    assert_eq!(fs::read(&second.written[0]).unwrap(), before);
}

#[tokio::test]
async fn preserve_tree_keeps_relative_directories() {
    let project = Project::new();
    let source = project.file("assets/icons/ui/close.svg", &verbose_svg());

    let (imagemin, _) = project.imagemin(
        ImageminOptions::new()
            .with_preserve_tree(PreserveTree::Root("assets".into()))
            .with_hash_length(8),
    );
    imagemin.load(source.to_str().unwrap()).await.unwrap();
    let report = imagemin.write_bundle(project.out_dir()).await;

    let (output_path, _) = imagemin.table().entries().remove(0);
    assert!(output_path.starts_with("icons/ui/close-"), "{output_path}");
    assert!(report.written[0].starts_with(project.out_dir().join("icons/ui")));
}

#[tokio::test]
async fn relative_ids_resolve_against_cwd() {
    let project = Project::new();
    project.file("src/images/dot.png", &loose_png());

    let (imagemin, reporter) = project.imagemin(ImageminOptions::new().with_include("src/**/*.png"));
    assert!(imagemin.accepts("src/images/dot.png"));
    assert!(!imagemin.accepts("vendor/dot.png"));

    let code = imagemin.load("./src/images/dot.png").await.unwrap();
    assert!(code.is_some());
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn excluded_and_virtual_ids_are_ignored() {
    let project = Project::new();
    let kept = project.file("src/a.png", &loose_png());
    let skipped = project.file("src/raw/b.png", &loose_png());

    let (imagemin, _) = project.imagemin(ImageminOptions::new().with_exclude("src/raw/**"));

    assert!(imagemin.load(kept.to_str().unwrap()).await.unwrap().is_some());
    assert!(imagemin.load(skipped.to_str().unwrap()).await.unwrap().is_none());
    assert!(imagemin.load("\0imagemin:virtual.png").await.unwrap().is_none());
    assert_eq!(imagemin.table().len(), 1);
}

#[tokio::test]
async fn failures_are_isolated_per_asset() {
    let project = Project::new();
    let good = project.file("good.png", &loose_png());
    let corrupt = project.file("corrupt.png", b"\x89PNG\r\n\x1a\nthis is not a png");
    let missing = project.root().join("missing.png");

    let (imagemin, reporter) = project.imagemin(ImageminOptions::new());
    let ids = [good, corrupt, missing];
    let results = join_all(ids.iter().map(|id| imagemin.load(id.to_str().unwrap()))).await;

    assert!(results[0].as_ref().unwrap().is_some());
    assert!(matches!(results[1], Err(ImageminError::Transform { .. })));
    assert!(matches!(results[2], Err(ImageminError::Read { .. })));

    let stages: Vec<Stage> = reporter.errors().iter().map(|e| e.stage).collect();
    assert_eq!(stages.len(), 2);
    assert!(stages.contains(&Stage::Read));
    assert!(stages.contains(&Stage::Transform));

    let report = imagemin.write_bundle(project.out_dir()).await;
    assert_eq!(report.written.len(), 1);
}

#[tokio::test]
async fn build_end_scans_extra_directories() {
    let project = Project::new();
    project.file("static/icons/a.svg", &verbose_svg());
    project.file("static/icons/b.svg", &verbose_svg());
    project.file("static/photos/c.jpg", &heavy_jpeg());
    project.file("static/notes.txt", b"not an image");

    let (imagemin, reporter) = project.imagemin(
        ImageminOptions::new().with_dirs(["static/**/*.svg", "static/photos/*.jpg"]),
    );
    let report = imagemin.build_end().await;

    assert!(report.is_success());
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.processed.len(), 3);
    // Same content, different stems: two entries.
    assert_eq!(imagemin.table().len(), 3);

    let written = imagemin.write_bundle(project.out_dir()).await.written;
    assert_eq!(written.len(), 3);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn build_end_without_dirs_is_a_no_op() {
    let project = Project::new();
    let (imagemin, _) = project.imagemin(ImageminOptions::new());

    let report = imagemin.build_end().await;
    assert!(report.files.is_empty());
    assert!(imagemin.table().is_empty());
}

#[tokio::test]
async fn identical_content_under_one_name_is_emitted_once() {
    let project = Project::new();
    let first = project.file("a/logo.png", &loose_png());
    let second = project.file("b/logo.png", &loose_png());

    let (imagemin, _) = project.imagemin(ImageminOptions::new());
    imagemin.load(first.to_str().unwrap()).await.unwrap();
    imagemin.load(second.to_str().unwrap()).await.unwrap();

    assert_eq!(imagemin.table().len(), 1);
    let report = imagemin.write_bundle(project.out_dir()).await;
    assert_eq!(report.written.len(), 1);
}
