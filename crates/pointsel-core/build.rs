// gdal-sys does the linking; rebuild when the GDAL installation used by the
// GeoPackage and archive readers changes.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for var in ["GDAL_HOME", "GDAL_DATA", "GDAL_DRIVER_PATH"] {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    if std::env::var("GDAL_HOME").is_err() {
        println!("cargo:warning=GDAL_HOME not set, falling back to pkg-config / system GDAL");
    }
}
