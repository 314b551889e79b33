//! Closed bidirectional extension <-> resource-type-name mapping (spec §3.4).
//!
//! Several extensions collapse onto the same type name — `dbx`/`bin`/
//! `dbmanifest`/`nonres` all map to `<non-resource>`, and `dbxdeleted`/
//! `resdeleted` both map to `*deleted*` — so the reverse direction needs
//! the stored path as a hint to pick the right one back (spec §4.5 step 5).

/// `(lowercase extension, canonical type name)`, straight from the
/// reference tool's `dic`.
const TABLE: &[(&str, &str)] = &[
    ("swfmovie", "SwfMovie"),
    ("dx10pixelshader", "Dx10PixelShader"),
    ("havokphysicsdata", "HavokPhysicsData"),
    ("treemeshset", "TreeMeshSet"),
    ("terrainheightfield", "TerrainHeightfield"),
    ("itexture", "ITexture"),
    ("animtreeinfo", "AnimTreeInfo"),
    ("irradiancevolume", "IrradianceVolume"),
    ("visualterrain", "VisualTerrain"),
    ("skinnedmeshset", "SkinnedMeshSet"),
    ("dx10vertexshader", "Dx10VertexShader"),
    ("aimanimation", "AimAnimation"),
    ("occludermesh", "OccluderMesh"),
    ("dx9shaderdatabase", "Dx9ShaderDatabase"),
    ("wave", "Wave"),
    ("sootmesh", "SootMesh"),
    ("terrainmaterialmap", "TerrainMaterialMap"),
    ("rigidmeshset", "RigidMeshSet"),
    ("compositemeshset", "CompositeMeshSet"),
    ("watermesh", "WaterMesh"),
    ("visualwater", "VisualWater"),
    ("dx9vertexshader", "Dx9VertexShader"),
    ("dx9pixelshader", "Dx9PixelShader"),
    ("dx11shaderdatabase", "Dx11ShaderDatabase"),
    ("dx11pixelshader", "Dx11PixelShader"),
    ("grannymodel", "GrannyModel"),
    ("ragdollresource", "RagdollResource"),
    ("grannyanimation", "GrannyAnimation"),
    ("weathersystem", "WeatherSystem"),
    ("dx11vertexshader", "Dx11VertexShader"),
    ("terrain", "Terrain"),
    ("impulseresponse", "ImpulseResponse"),
    ("binkmemory", "BinkMemory"),
    ("deltaanimation", "DeltaAnimation"),
    ("dx10shaderdatabase", "Dx10ShaderDatabase"),
    ("meshdata", "MeshData"),
    ("xenonpixelshader", "XenonPixelShader"),
    ("xenonvertexshader", "XenonVertexShader"),
    ("xenonshaderdatabase", "XenonShaderDatabase"),
    ("xenontexture", "XenonTexture"),
    ("ps3pixelshader", "Ps3PixelShader"),
    ("ps3vertexshader", "Ps3VertexShader"),
    ("ps3shaderdatabase", "Ps3ShaderDatabase"),
    ("ps3texture", "Ps3Texture"),
    ("pathdatadefinition", "PathDataDefinition"),
    ("nonres", "<non-resource>"),
    ("dbx", "<non-resource>"),
    ("dbxdeleted", "*deleted*"),
    ("resdeleted", "*deleted*"),
    ("bin", "<non-resource>"),
    ("dbmanifest", "<non-resource>"),
];

/// Forward lookup used by the packer: lowercase extension -> canonical
/// type name. Unknown extensions are `None` — callers skip the file.
pub fn type_for_extension(ext: &str) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, t)| *t)
}

/// Reverse lookup used by the unpacker (spec §4.5 step 5). `stored_path`
/// resolves the ambiguous `*deleted*` / `<non-resource>` groups, which
/// collapse several extensions onto one type name.
pub fn extension_for_type(type_name: &str, stored_path: &str) -> String {
    let existing = path_extension(stored_path);
    match type_name {
        "*deleted*" => {
            if existing.eq_ignore_ascii_case("dbx") {
                "dbxdeleted".to_string()
            } else {
                "resdeleted".to_string()
            }
        }
        "<non-resource>" => {
            if existing.eq_ignore_ascii_case("res") {
                "nonres".to_string()
            } else {
                existing.to_string()
            }
        }
        other => TABLE
            .iter()
            .find(|(_, t)| *t == other)
            .map(|(e, _)| e.to_string())
            .unwrap_or_else(|| existing.to_string()),
    }
}

fn path_extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(i) => &name[i + 1..],
        None => "",
    }
}
