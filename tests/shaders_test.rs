use inkflow::backend::Kernel;
use inkflow::shaders::KernelSources;
use inkflow::{EmbeddedShaders, FluidError, ShaderDirectory, ShaderSource};

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("inkflow_{name}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_embedded_programs_cover_every_kernel() {
    let sources = KernelSources::load(&EmbeddedShaders).unwrap();
    for kernel in Kernel::ALL {
        let text = sources.get(kernel);
        assert!(text.contains("@compute"), "{kernel} has a compute entry point");
        assert!(text.contains("fn main"), "{kernel} uses the shared entry point name");
        assert!(text.contains("struct Params"), "{kernel} declares the parameter block");
    }
}

#[test]
fn test_unknown_program_is_missing() {
    assert!(matches!(
        EmbeddedShaders.load("display"),
        Err(FluidError::MissingKernel(name)) if name == "display"
    ));
}

#[test]
fn test_missing_directory_fails_up_front() {
    let provider = ShaderDirectory::new("/nonexistent/inkflow/shaders");
    let result = KernelSources::load(&provider);
    assert!(matches!(result, Err(FluidError::MissingKernel(name)) if name == "advect"));
}

#[test]
fn test_directory_provider_loads_files() {
    let dir = scratch_dir("shaders");
    for kernel in Kernel::ALL {
        let text = EmbeddedShaders.load(kernel.name()).unwrap();
        std::fs::write(dir.join(format!("{}.wgsl", kernel.name())), text).unwrap();
    }

    let provider = ShaderDirectory::new(&dir);
    assert_eq!(provider.path_of("jacobi"), dir.join("jacobi.wgsl"));
    let sources = KernelSources::load(&provider).unwrap();
    assert_eq!(sources.get(Kernel::Splat), EmbeddedShaders.load("splat").unwrap());

    // An empty program counts as missing.
    std::fs::write(dir.join("gradient.wgsl"), "  \n").unwrap();
    let result = KernelSources::load(&provider);
    assert!(matches!(result, Err(FluidError::MissingKernel(name)) if name == "gradient"));

    std::fs::remove_dir_all(&dir).ok();
}
