use super::catalog::FREEFORM_TASK_ID;

pub const DEFAULT_TEMPLATE: &str = "Enhance this photo with professional color grading, improved lighting and contrast, and sharpened details for a crisp, high-quality result.";

/// Joins the free-form system instruction and the user's literal request.
pub const FREEFORM_SEPARATOR: &str = "\n\nUser request: ";

const PROMPT_TEMPLATES: &[(&str, &str)] = &[
    (
        "FACE_SWAP_POSTER",
        "Place the face onto the character in the movie poster, preserving the identity and facial structure from the source photo, matching head pose and lighting and blending skin tones naturally; cinematic color grade; 85mm portrait look; high fidelity, crisp edges; 4:5 portrait output; constraints: keep body proportions, no distortion; negative: no artifacts, no extra teeth, no blur, no warped face.",
    ),
    (
        "OUTFIT_TRYON_AODAI",
        "AI outfit try-on: replace the current outfit with a traditional white Vietnamese ao dai, keeping body shape and pose, with realistic fabric folds and texture; soft natural light; 50mm lens; photographic, skin tones preserved; 3:4 portrait output; constraints: keep facial identity; negative: no misplaced buttons, no embossed patterns, no plastic sheen.",
    ),
    (
        "REPLACE_BG_ADD_PROP",
        "Replace the background with a rainy Tokyo street at night lit by neon signs and add a prop: holding a clear umbrella, matching perspective and shadows; wet reflective ground, rim light on the hair; 35mm lens; film color with teal-orange tones; high detail; 9:16 portrait output; constraints: keep facial identity, preserve hand anatomy; negative: no duplicate hands, no floating props, no mismatched shadows.",
    ),
    (
        "RESTORE_COLORIZE",
        "Restore and colorize the photo: remove scratches, dust and blemishes, rebuild lost detail in faces and clothing, apply natural realistic color with accurate skin tones; add light film grain for a vintage feel using a 1960s palette; constraints: keep the subject's facial features faithful; negative: no over-smoothing, no halos, no plastic skin.",
    ),
    (
        "STYLE_TRANSFER_ANIME",
        "Restyle the photo as a Studio Ghibli anime scene. Use watercolor textures, a soft pastel palette and clean line work. Give the subject large expressive eyes while keeping key identifying traits such as the hairstyle. The background should be a lush green field with gentle sunlight filtering through the trees; 1:1 square output; constraints: keep the original hair shape and color; negative: no extra limbs, no text overlays, no messy outlines.",
    ),
    (
        "REMOVE_OBJECT",
        "Remove the most prominent unwanted object or person in the background and inpaint it with consistent texture and perspective that blends seamlessly with the surroundings; keep existing lighting continuous; keep edges around the main subject crisp; constraints: preserve nearby shadows and reflections; negative: no smudges, no repeated patterns, no artifacts.",
    ),
    (
        "UPSCALE_4X",
        "Upscale the image 4x. Enhance detail, sharpen edges and reduce noise while keeping a natural look. Reconstruct facial features and textures with high fidelity. The result must be a realistic, high-resolution image. negative: no plastic skin, no over-sharpening, no artifacts.",
    ),
    (
        "BEAUTIFY_PORTRAIT",
        "Subtly beautify the portrait. Smooth skin texture naturally, reduce blemishes and acne, slightly brighten the eyes and whiten the teeth. Keep the original skin tone and facial structure. The goal is a natural enhancement, not an artificial look. negative: no plastic skin, no blurred detail, no over-bright eyes.",
    ),
    (
        "REPLACE_BG",
        "Replace the background with a peaceful beach at sunset. Make the light on the subject match the golden-hour light of the new background, with soft shadows. The transition between subject and background must be seamless. negative: no hard edges, no mismatched lighting.",
    ),
    (
        "CHANGE_SCENE_DAY_NIGHT",
        "Turn the scene from day into night. Add a starry sky, a bright full moon and artificial light sources such as street lamps. Create realistic shadows and reflections from the new lighting. The mood should be calm and serene. negative: no unrealistic lighting, no noise.",
    ),
    (
        "ADD_OBJECT_PET",
        "Add a small fluffy golden retriever puppy sitting at the subject's feet, looking up at the subject. Make sure the puppy's lighting, shadows and perspective match the scene perfectly. negative: no floating pets, no mismatched shadows.",
    ),
    (
        "TREND_AI_AVATAR",
        "Create a professional AI avatar / yearbook photo. Place the subject against a classic studio backdrop with three-point studio lighting. The final image must look like a high-quality studio portrait with high fidelity and natural skin texture. negative: no artifacts, no plastic skin.",
    ),
    (
        "TREND_CINEMATIC_STILLS",
        "Give the photo a cinematic look. Apply a teal and orange grade, a 2.35:1 letterbox aspect ratio and subtle film grain. The lighting should feel dramatic and deliberate, like a still from a film. Shallow depth of field, anamorphic bokeh. negative: no color banding, no oversaturation.",
    ),
    (
        "TREND_3D_PARALLAX",
        "Create a 2.5D parallax effect. Gently separate the foreground subject from the background to create a sense of depth. Motion should be slow and smooth.",
    ),
    (
        "TREND_FACE_SWAP_MV",
        "Using the two images provided, perform a face swap. Take the face from the second image and place it onto the person in the first image. Keep the hair, body, clothing and background from the first image. The result must be a seamless, realistic blend that matches the skin tone, lighting and head angle of the first image.",
    ),
    (
        "TREND_NEON_GLITCH",
        "Apply a futuristic neon and glitch effect. Add glowing neon lines along the subject's silhouette and subtle digital noise and static in the background. The palette should be cyberpunk inspired (pink, blue, purple).",
    ),
    (
        "SHARPEN_IMAGE",
        "Significantly sharpen and deblur the image. Enhance and rebuild fine detail, especially in faces, hair and textures, to recover information lost to blur or low image quality. The final result must be a crisp, clear, highly detailed photo, as if shot with a high-end lens. negative: no digital artifacts, no sharpening halos, no plastic-looking skin.",
    ),
    (
        "IMAGE_COLLAGE",
        "Create an artistic collage from ALL of the provided images. Arrange them into a cohesive, creative layout. By default, use a simple clean grid with thin white borders unless other instructions are added to this description.",
    ),
    (
        "EDIT_NANO_BANANA",
        "You are Nano Banana, a creative AI assistant. Edit this image according to the user's request. Aim for a high-quality, creative and surprising result.",
    ),
    (
        "FILTER_BW_NOIR",
        "Apply a film-noir black and white filter. Increase contrast, create deep shadows and strong highlights for a dramatic, mysterious mood. Keep detail in both shadows and highlights.",
    ),
    (
        "FILTER_BW_HIGH_CONTRAST",
        "Convert the photo to black and white with extreme contrast. Make blacks deep and whites brilliant, removing most mid-grey tones for a bold graphic look.",
    ),
    (
        "FILTER_VINTAGE_SEPIA",
        "Apply a classic sepia tone to the photo for a warm brown cast. Slightly reduce contrast and add a little grain to mimic old photographs.",
    ),
    (
        "FILTER_VINTAGE_FADED",
        "Create a faded vintage look. Reduce saturation, lift the blacks for a light haze and shift blues toward teal for a nostalgic feel.",
    ),
    (
        "FILTER_FILM_KODAK",
        "Emulate classic Kodak film. Boost saturation of the primaries (red, blue, yellow) for vivid, warm color and a touch of contrast for an authentic vintage look.",
    ),
    (
        "FILTER_FILM_FUJI",
        "Emulate classic Fuji film, with subtle green and blue tones, natural skin tones and gentle contrast for a soft, slightly cool and clean look.",
    ),
    (
        "FILTER_CINEMATIC_TEAL_ORANGE",
        "Apply a cinematic teal and orange grade. Push cool tones (shadows, sky) toward teal and warm tones (skin, light) toward orange. Increase contrast for a dramatic, professional look.",
    ),
    (
        "FILTER_CINEMATIC_MOODY",
        "Create a moody cinematic look. Lower overall saturation, deepen the shadows and apply a cool blue or green cast to the dark areas. Keep selective warm highlights for depth.",
    ),
    (
        "FILTER_NATURAL_VIBRANT",
        "Subtly enhance the natural colors of the photo. Make colors richer and more vivid without oversaturating or looking fake. Improve clarity and add slight contrast to bring out detail.",
    ),
    (
        "FILTER_NATURAL_SOFT",
        "Apply a soft natural look. Slightly reduce contrast, soften the highlights and add a touch of warmth for a gentle, dreamy feel.",
    ),
    (
        "FILTER_NOSTALGIC_80S",
        "Recreate the look of 1980s photography: slightly saturated color, a hint of magenta in the shadows and light film grain, evoking the analog film era.",
    ),
    (
        "FILTER_NOSTALGIC_90S",
        "Recreate the look of 1990s photography: truer colors with mild contrast and a slightly warm tone, like prints from a popular point-and-shoot film camera of the time.",
    ),
    (
        "FILTER_FOOD_FRESH",
        "Optimize the food photo to look fresh. Selectively increase brightness, saturation and sharpness. Make greens and reds pop to emphasize fresh ingredients.",
    ),
    (
        "FILTER_FOOD_WARM",
        "Optimize the food photo for a cozy, inviting feel. Add warm tones and increase contrast for depth so the dish looks more appetizing.",
    ),
];

/// Catalog template for `task_id`, or [`DEFAULT_TEMPLATE`] when unknown or absent.
pub fn template_for(task_id: Option<&str>) -> &'static str {
    let Some(task_id) = task_id else {
        return DEFAULT_TEMPLATE;
    };
    PROMPT_TEMPLATES
        .iter()
        .find(|(id, _)| *id == task_id)
        .map(|(_, template)| *template)
        .unwrap_or(DEFAULT_TEMPLATE)
}

/// Prompt shown to the user when a task is picked.
///
/// The free-form task starts empty so the caller can show placeholder
/// guidance; every other id is a table lookup.
pub fn resolve_prompt(task_id: Option<&str>) -> String {
    if task_id == Some(FREEFORM_TASK_ID) {
        return String::new();
    }
    template_for(task_id).to_string()
}

/// Text actually sent for the free-form task.
pub fn freeform_instruction(user_prompt: &str) -> String {
    format!(
        "{}{}\"{}\"",
        template_for(Some(FREEFORM_TASK_ID)),
        FREEFORM_SEPARATOR,
        user_prompt
    )
}
